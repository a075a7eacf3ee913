//! gandi-rpc
//!
//! Wire layer for the Gandi hosting API: the XML-RPC value model, the codec
//! with its explicit nil switches, and the transport the CLI talks through.
//!
//! Public API:
//! - `value::Value`: XML-RPC value, bridged to `serde_json::Value`
//! - `codec::{encode_call, decode_response, CodecOptions}`: document codec
//! - `transport::{RpcTransport, HttpTransport}`: transport trait and HTTPS implementation

pub mod codec;
pub mod transport;
pub mod value;

pub use codec::CodecOptions;
pub use transport::{HttpTransport, RpcTransport, DEFAULT_ENDPOINT};
pub use value::Value;
