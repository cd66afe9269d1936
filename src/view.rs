pub mod debounce;
pub mod list_view;
pub mod query_cache;
pub mod route_state;
pub mod tag_list;
