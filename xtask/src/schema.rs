// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schema introspection and parity comparison for the two migration sets.
//!
//! Both backends are reduced to the same normalized shape: column type
//! family and nullability, primary key, foreign keys, unique constraints
//! and secondary indexes (compared by column list, not by name).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use color_eyre::{eyre::Context, Result};
use diesel::sql_types::{Integer, Text};
use diesel::{MysqlConnection, QueryableByName, RunQueryDsl, SqliteConnection};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Table {
    /// Column name to (type family, nullable).
    columns: BTreeMap<String, (TypeFamily, bool)>,
    primary_key: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
    unique_constraints: BTreeSet<Vec<String>>,
    indexes: BTreeSet<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TypeFamily {
    Integer,
    Real,
    Text,
    Blob,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    column: String,
    references_table: String,
    references_column: String,
}

/// Maps a `SQLite` declared type to its family using `SQLite`'s affinity rules.
fn sqlite_family(declared: &str) -> TypeFamily {
    let upper: String = declared.to_uppercase();
    if upper.contains("INT") {
        TypeFamily::Integer
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        TypeFamily::Real
    } else if upper.contains("BLOB") {
        TypeFamily::Blob
    } else {
        TypeFamily::Text
    }
}

fn mysql_family(data_type: &str) -> TypeFamily {
    match data_type.to_uppercase().as_str() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => TypeFamily::Integer,
        "DECIMAL" | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" => TypeFamily::Real,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            TypeFamily::Blob
        }
        _ => TypeFamily::Text,
    }
}

/// Introspects a migrated `SQLite` database.
pub fn introspect_sqlite(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        origin: String,
    }

    #[derive(QueryableByName)]
    struct IndexColumn {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    let mut schema = Schema::default();
    for TableName { name: table_name } in tables {
        let mut table = Table::default();

        let columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info({table_name})"))
                .load(conn)
                .wrap_err_with(|| format!("Failed to get columns for table {table_name}"))?;
        for col in columns {
            // An INTEGER PRIMARY KEY is a rowid alias and never NULL even
            // though table_info reports notnull = 0.
            let nullable: bool = col.notnull == 0 && col.pk == 0;
            table
                .columns
                .insert(col.name.clone(), (sqlite_family(&col.r#type), nullable));
            if col.pk > 0 {
                table.primary_key.insert(col.name);
            }
        }

        let fks: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({table_name})"))
                .load(conn)
                .wrap_err_with(|| format!("Failed to get foreign keys for table {table_name}"))?;
        table.foreign_keys = fks
            .into_iter()
            .map(|fk| ForeignKey {
                column: fk.from,
                references_table: fk.table,
                references_column: fk.to,
            })
            .collect();

        let indexes: Vec<IndexInfo> =
            diesel::sql_query(format!("PRAGMA index_list({table_name})"))
                .load(conn)
                .wrap_err_with(|| format!("Failed to get indexes for table {table_name}"))?;
        for idx in indexes {
            let columns: Vec<String> =
                diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                    .load::<IndexColumn>(conn)
                    .wrap_err_with(|| format!("Failed to get index columns for {}", idx.name))?
                    .into_iter()
                    .map(|c| c.name)
                    .collect();

            match idx.origin.as_str() {
                "u" => {
                    table.unique_constraints.insert(columns);
                }
                "c" => {
                    table.indexes.insert(columns);
                }
                _ => {}
            }
        }

        schema.tables.insert(table_name, table);
    }

    Ok(schema)
}

/// Introspects a migrated `MySQL`/`MariaDB` database.
pub fn introspect_mysql(conn: &mut MysqlConnection, database: &str) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        table_name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        data_type: String,
        #[diesel(sql_type = Text)]
        is_nullable: String,
        #[diesel(sql_type = Text)]
        column_key: String,
    }

    #[derive(QueryableByName)]
    #[allow(clippy::struct_field_names)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        referenced_table_name: String,
        #[diesel(sql_type = Text)]
        referenced_column_name: String,
    }

    #[derive(QueryableByName)]
    struct IndexRow {
        #[diesel(sql_type = Text)]
        index_name: String,
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Integer)]
        non_unique: i32,
    }

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = ? AND table_name != '__diesel_schema_migrations' ORDER BY table_name",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .wrap_err("Failed to query MySQL tables")?;

    let mut schema = Schema::default();
    for TableName { table_name } in tables {
        let mut table = Table::default();

        let columns: Vec<ColumnInfo> = diesel::sql_query(
            "SELECT column_name, data_type, is_nullable, column_key FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(&table_name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get columns for table {table_name}"))?;
        for col in columns {
            table.columns.insert(
                col.column_name.clone(),
                (mysql_family(&col.data_type), col.is_nullable == "YES"),
            );
            if col.column_key == "PRI" {
                table.primary_key.insert(col.column_name);
            }
        }

        let fks: Vec<ForeignKeyInfo> = diesel::sql_query(
            "SELECT column_name, referenced_table_name, referenced_column_name \
             FROM information_schema.key_column_usage \
             WHERE table_schema = ? AND table_name = ? AND referenced_table_name IS NOT NULL",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(&table_name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get foreign keys for table {table_name}"))?;
        table.foreign_keys = fks
            .into_iter()
            .map(|fk| ForeignKey {
                column: fk.column_name,
                references_table: fk.referenced_table_name,
                references_column: fk.referenced_column_name,
            })
            .collect();

        // Unique keys and secondary indexes both live in statistics.
        let rows: Vec<IndexRow> = diesel::sql_query(
            "SELECT index_name, column_name, non_unique FROM information_schema.statistics \
             WHERE table_schema = ? AND table_name = ? AND index_name != 'PRIMARY' \
             ORDER BY index_name, seq_in_index",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(&table_name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get indexes for table {table_name}"))?;

        let mut grouped: BTreeMap<String, (bool, Vec<String>)> = BTreeMap::new();
        for row in rows {
            grouped
                .entry(row.index_name)
                .or_insert_with(|| (row.non_unique == 0, Vec::new()))
                .1
                .push(row.column_name);
        }
        for (unique, columns) in grouped.into_values() {
            if unique {
                table.unique_constraints.insert(columns);
            } else {
                table.indexes.insert(columns);
            }
        }

        schema.tables.insert(table_name, table);
    }

    Ok(schema)
}

fn ensure_equal<T: PartialEq + Debug>(what: &str, table: &str, sqlite: &T, mysql: &T) -> Result<()> {
    if sqlite == mysql {
        return Ok(());
    }
    Err(color_eyre::eyre::eyre!(
        "Schema parity check FAILED: {what} mismatch in table '{table}'\n  SQLite: {sqlite:?}\n  MySQL: {mysql:?}"
    ))
}

/// Fails on the first structural difference between the two schemas.
///
/// `InnoDB` adds a single-column index for every foreign key that no other
/// index covers, so `MySQL` may carry extra indexes of exactly that shape.
pub fn compare(sqlite: &Schema, mysql: &Schema) -> Result<()> {
    let sqlite_tables: BTreeSet<&String> = sqlite.tables.keys().collect();
    let mysql_tables: BTreeSet<&String> = mysql.tables.keys().collect();
    ensure_equal("Table set", "*", &sqlite_tables, &mysql_tables)?;

    for (name, lite) in &sqlite.tables {
        let Some(my) = mysql.tables.get(name) else {
            continue;
        };

        ensure_equal("Column", name, &lite.columns, &my.columns)?;
        ensure_equal("Primary key", name, &lite.primary_key, &my.primary_key)?;
        ensure_equal("Foreign key", name, &lite.foreign_keys, &my.foreign_keys)?;
        ensure_equal(
            "Unique constraint",
            name,
            &lite.unique_constraints,
            &my.unique_constraints,
        )?;

        if let Some(missing) = lite.indexes.difference(&my.indexes).next() {
            return Err(color_eyre::eyre::eyre!(
                "Schema parity check FAILED: Index {missing:?} missing in MySQL for table '{name}'"
            ));
        }

        let fk_columns: BTreeSet<&String> = my.foreign_keys.iter().map(|fk| &fk.column).collect();
        for extra in my.indexes.difference(&lite.indexes) {
            let is_fk_index: bool = matches!(extra.as_slice(), [column] if fk_columns.contains(column));
            if !is_fk_index {
                return Err(color_eyre::eyre::eyre!(
                    "Schema parity check FAILED: Unexpected index {extra:?} in MySQL for table '{name}'"
                ));
            }
        }
    }

    Ok(())
}
