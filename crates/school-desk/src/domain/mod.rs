mod page;
mod school_year;
mod tenant;

pub use page::{ListMeta, Paginated};
pub use school_year::{FieldError, SchoolYear, SchoolYearForm, SchoolYearRef, SchoolYearStatus};
pub use tenant::{
    AccessRequest, AccessRequestStatus, Tenant, TenantRef, TenantStatus, User, UserRole,
};
