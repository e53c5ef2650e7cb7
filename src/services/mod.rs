pub mod du_service;
pub mod join_service;
pub mod packlist_service;
pub mod report_service;
pub mod resolve_service;
pub mod stat_service;
pub mod summary_service;
pub mod tree_service;
