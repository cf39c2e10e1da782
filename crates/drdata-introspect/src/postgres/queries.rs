//! Read-only catalog queries.
//!
//! Every name column is cast to `text` so rows decode into `String`
//! regardless of the catalog's internal `name` type.

use sqlx::PgPool;

pub async fn fetch_database_name(pool: &PgPool) -> Result<String, sqlx::Error> {
    sqlx::query_scalar::<_, String>("select current_database()::text")
        .fetch_one(pool)
        .await
}

pub async fn list_tables(
    pool: &PgPool,
    namespace: &str,
    include_partitioned: bool,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        select c.relname::text
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and (c.relkind = 'r' or (c.relkind = 'p' and $2::bool))
          and not c.relispartition
        order by c.relname
        "#,
    )
    .bind(namespace)
    .bind(include_partitioned)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct ColumnRow {
    pub ordinal_position: i16,
    pub name: String,
    pub data_type: String,
    pub udt_schema: String,
    pub udt_name: String,
    pub is_nullable: bool,
    pub column_default: Option<String>,
    pub identity_generation: Option<String>,
    pub is_generated: bool,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

/// Columns of one table. Domains report their base type.
pub async fn list_columns(
    pool: &PgPool,
    namespace: &str,
    table: &str,
) -> Result<Vec<ColumnRow>, sqlx::Error> {
    sqlx::query_as::<_, ColumnRow>(
        r#"
        select
          a.attnum::int2 as ordinal_position,
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type,
          coalesce(btn.nspname, tn.nspname)::text as udt_schema,
          coalesce(bt.typname, t.typname)::text as udt_name,
          (not a.attnotnull) as is_nullable,
          pg_get_expr(ad.adbin, ad.adrelid) as column_default,
          case a.attidentity
            when 'a' then 'ALWAYS'
            when 'd' then 'BY DEFAULT'
            else null
          end as identity_generation,
          (a.attgenerated <> '') as is_generated,
          ic.character_maximum_length::int4 as character_max_length,
          ic.numeric_precision::int4 as numeric_precision,
          ic.numeric_scale::int4 as numeric_scale
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        join pg_type t on t.oid = a.atttypid
        join pg_namespace tn on tn.oid = t.typnamespace
        left join pg_type bt on t.typtype = 'd' and bt.oid = t.typbasetype
        left join pg_namespace btn on btn.oid = bt.typnamespace
        left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
        left join information_schema.columns ic
          on ic.table_schema = n.nspname
         and ic.table_name = c.relname
         and ic.column_name = a.attname
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(namespace)
    .bind(table)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct KeyRow {
    pub name: String,
    /// `p` for the primary key, `u` for unique constraints.
    pub kind: String,
    pub columns: Vec<String>,
}

pub async fn list_keys(
    pool: &PgPool,
    namespace: &str,
    table: &str,
) -> Result<Vec<KeyRow>, sqlx::Error> {
    sqlx::query_as::<_, KeyRow>(
        r#"
        select
          con.conname::text as name,
          con.contype::text as kind,
          array_agg(att.attname::text order by k.ord)::text[] as columns
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        join unnest(con.conkey) with ordinality as k(attnum, ord) on true
        join pg_attribute att on att.attrelid = rel.oid and att.attnum = k.attnum
        where nsp.nspname = $1
          and rel.relname = $2
          and con.contype in ('p', 'u')
        group by con.conname, con.contype
        order by con.contype, con.conname
        "#,
    )
    .bind(namespace)
    .bind(table)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct ForeignKeyRow {
    pub name: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub columns: Vec<String>,
    pub referenced_columns: Vec<String>,
}

/// Foreign keys declared on one table, with source and referenced columns
/// unnested pairwise so composite keys keep their column correspondence.
/// Constraints cloned onto partitions (`conparentid <> 0`) are skipped.
pub async fn list_foreign_keys(
    pool: &PgPool,
    namespace: &str,
    table: &str,
) -> Result<Vec<ForeignKeyRow>, sqlx::Error> {
    sqlx::query_as::<_, ForeignKeyRow>(
        r#"
        select
          con.conname::text as name,
          ref_nsp.nspname::text as referenced_schema,
          ref_rel.relname::text as referenced_table,
          array_agg(src_att.attname::text order by k.ord)::text[] as columns,
          array_agg(ref_att.attname::text order by k.ord)::text[] as referenced_columns
        from pg_constraint con
        join pg_class src_rel on src_rel.oid = con.conrelid
        join pg_namespace src_nsp on src_nsp.oid = src_rel.relnamespace
        join pg_class ref_rel on ref_rel.oid = con.confrelid
        join pg_namespace ref_nsp on ref_nsp.oid = ref_rel.relnamespace
        join unnest(con.conkey, con.confkey) with ordinality as k(src_attnum, ref_attnum, ord)
          on true
        join pg_attribute src_att
          on src_att.attrelid = con.conrelid and src_att.attnum = k.src_attnum
        join pg_attribute ref_att
          on ref_att.attrelid = con.confrelid and ref_att.attnum = k.ref_attnum
        where src_nsp.nspname = $1
          and src_rel.relname = $2
          and con.contype = 'f'
          and con.conparentid = 0
        group by con.conname, ref_nsp.nspname, ref_rel.relname
        order by con.conname
        "#,
    )
    .bind(namespace)
    .bind(table)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct EnumRow {
    pub schema: String,
    pub name: String,
    pub labels: Vec<String>,
}

pub async fn list_enums(pool: &PgPool) -> Result<Vec<EnumRow>, sqlx::Error> {
    sqlx::query_as::<_, EnumRow>(
        r#"
        select
          n.nspname::text as schema,
          t.typname::text as name,
          array_agg(e.enumlabel::text order by e.enumsortorder)::text[] as labels
        from pg_type t
        join pg_namespace n on n.oid = t.typnamespace
        join pg_enum e on e.enumtypid = t.oid
        group by n.nspname, t.typname
        order by n.nspname, t.typname
        "#,
    )
    .fetch_all(pool)
    .await
}
