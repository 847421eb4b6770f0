// Library for tests to access modules

pub mod audit_repo;
pub mod config;
pub mod error;
pub mod host_repo;
pub mod log_demux;
pub mod metrics_aggregator;
pub mod models;
pub mod routes;
pub mod runtime_gateway;
pub mod sample_worker;
pub mod stats_sampler;
pub mod version;
