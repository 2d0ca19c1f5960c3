//! Request-time routing: virtual hosts, locations and the reply buffer

mod reply;
mod request;
mod router;
mod vhost;

pub use self::reply::{ForwardTarget, Reply};
pub use self::request::{RequestInfo, strip_port};
pub use self::router::find_location;
pub use self::vhost::{Listeners, VirtualHosts};
