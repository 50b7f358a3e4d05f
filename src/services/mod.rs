pub mod crm_service;
pub mod lead_api;
pub mod sheets;
