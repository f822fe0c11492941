pub mod audit_service;
pub use audit_service::{AuditError, AuditFilter, AuditPage, AuditService, SeaOrmAuditService};

pub mod dashboard_service;
pub use dashboard_service::{
    DashboardError, DashboardService, DashboardStats, SeaOrmDashboardService,
};

pub mod report_service;
pub use report_service::{
    ReportError, ReportFilter, ReportService, SeaOrmReportService, write_csv,
};

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{CreateUserRequest, UpdateUserRequest, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod visit_service;
pub mod visit_service_impl;
pub use visit_service::{VisitError, VisitService};
pub use visit_service_impl::SeaOrmVisitService;

pub mod visitor_service;
pub mod visitor_service_impl;
pub use visitor_service::{VisitorError, VisitorService};
pub use visitor_service_impl::SeaOrmVisitorService;
