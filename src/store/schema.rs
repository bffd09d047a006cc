//! Relational schema for the persistent symbol index.
//!
//! Four tables keyed by USR and path. Uniqueness constraints implement the
//! insert-or-ignore semantics of the index: one canonical definition per
//! USR, one referenced USR per reference site, one inheritance edge per
//! (sub, super) pair. Include edges are scoped per translation unit because
//! two units may include the same header at different effective depths.

pub const SCHEMA_SQL: &str = r#"
create table if not exists defs (
    usr    text not null,
    path   text not null,
    offset integer not null
);

create unique index if not exists idx_defs_usr on defs(usr);

create table if not exists refs (
    usr              text not null,
    path             text not null,
    offset           integer not null,
    enclosing_offset integer not null
);

create unique index if not exists idx_refs_site on refs(path, offset);

create table if not exists classes (
    sub_usr    text not null,
    super_usr  text not null,
    sub_path   text not null,
    super_path text not null
);

create unique index if not exists idx_classes_edge on classes(sub_usr, super_usr);

create table if not exists includes (
    translation_unit text not null,
    source           text not null,
    include          text not null,
    depth            integer not null
);

create index if not exists idx_includes_tu_source on includes(translation_unit, source);
create index if not exists idx_includes_include on includes(include);
"#;
