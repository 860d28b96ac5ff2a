// Progressive analysis: request building, the driver that consumes the matching
// service's event stream, and the status observers subscribe to.

pub mod driver;
pub mod handlers;
pub mod progress;
pub mod request;
