mod client;
pub mod dicts;
mod errors;
mod model;
mod response;
pub mod stats;
pub mod strings;
pub use self::client::{
    autopage, check_deprecation, query_pairs, Encoder, Headers, Method, Params, RequestContext,
    RequestOptions, RestClient, UntilFn, UntilOptions, DEFAULT_CONTENT_TYPE,
    DEFAULT_MAX_ITERATIONS,
};
pub use self::errors::Error;
pub use self::model::{interpolate, ListOptions, Record, Resource, SaveOptions};
pub use self::response::{Envelope, EnvelopeBuilder, ErrorResponse, SuccessResponse};
pub use self::stats::{MemoryStats, NoopStats, Stats};
