pub mod handlers;

pub use handlers::{
    LogTarget, Session, format_node_row, format_node_table, init_tracing, load_source,
    parse_id_list,
};
