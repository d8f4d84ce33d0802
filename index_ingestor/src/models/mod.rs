pub mod index_id;
pub mod price_point;
pub mod request_params;
pub mod series_table;
