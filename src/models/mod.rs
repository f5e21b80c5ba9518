// Domain models shared by the service, the job runner and the HTTP layer

mod device;
mod job;
mod mac;

pub use device::{Device, DeviceFilter, DeviceSort, filter_and_sort};
pub use job::{BatchSummary, JobState, ProgressSnapshot, RenameRequest, RenameResult};
pub use mac::{InvalidMac, MacAddress};
