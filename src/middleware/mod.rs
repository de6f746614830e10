mod correlation;

pub use correlation::{
    CORRELATION_UUID_HEADER, CorrelationUuid, correlation_request_filter,
    correlation_response_filter,
};
