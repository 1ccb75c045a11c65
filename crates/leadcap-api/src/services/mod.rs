pub mod crm;
pub mod leads;
pub mod upload_broker;

pub use crm::{CrmForwarder, CrmLead, LoggingCrm};
pub use leads::LeadService;
pub use upload_broker::{UploadBroker, UploadPolicy};
