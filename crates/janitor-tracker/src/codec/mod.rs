//! Record codec between [`Resource`](crate::Resource) and table rows
//!
//! A row is the fixed column set plus one JSON blob column holding the
//! resource's additional fields. Fixed columns are authoritative over
//! same-named blob entries when decoding.

mod registry;
mod row;
mod value;

pub use registry::{DecoderRegistry, DefaultDecoder, ResourceDecoder};
pub use row::{
    decode_row, encode_attributes, encode_row, row_to_field_map, Column, EncodedRow, ResourceRow,
};
pub use value::SqlValue;
