pub mod endpoint;
pub mod field;
pub mod record;
pub mod request_log;
pub mod table;

pub use endpoint::{Endpoint, HttpMethod};
pub use field::{FieldDefinition, FieldType};
pub use record::{Record, RecordRow};
pub use request_log::{NewRequestLog, RequestLogEntry};
pub use table::{Table, TableEndpoint};
