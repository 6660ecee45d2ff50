mod payment;
mod project;
mod status;
mod theme;

pub use payment::Payment;
pub use project::{Project, ProjectDetails, ProjectId};
pub use status::{PaymentStatus, StatusFilter};
pub use theme::Theme;
