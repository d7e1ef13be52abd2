//! Container capability surface.
//!
//! [`WorkerContainer`] is the full set of operations the worker's process
//! manager codes against. The core (run, attach, stop, properties) is
//! required; every optional capability has a default body returning
//! [`BerthError::NotImplemented`], so a backend only writes the methods it
//! supports and callers never need a type check.

mod types;

pub use types::{
    BandwidthLimits, ContainerInfo, ContainerMetrics, CpuLimits, DiskLimits, IpRange,
    MemoryLimits, NetOutRule, NetProtocol, PortMapping, PortRange, ProcessIo, ProcessSignal,
    ProcessSpec, Properties, StreamInSpec, StreamOutSpec, TtySpec, WindowSize,
};

use crate::backend::Process;
use crate::runtime::IoReader;
use async_trait::async_trait;
use berth_shared::{BerthError, BerthResult};
use std::time::Duration;

#[async_trait]
pub trait WorkerContainer: Send + Sync {
    /// External handle of the container.
    fn handle(&self) -> &str;

    /// Signal the container's task; does not wait for it to exit.
    async fn stop(&self, kill: bool) -> BerthResult<()>;

    async fn run(&self, spec: ProcessSpec, io: ProcessIo) -> BerthResult<Process>;

    async fn attach(&self, process_id: &str, io: ProcessIo) -> BerthResult<Process>;

    async fn properties(&self) -> BerthResult<Properties>;

    /// Value of one property, or [`BerthError::NotFound`].
    async fn property(&self, name: &str) -> BerthResult<String>;

    async fn set_property(&self, name: &str, value: &str) -> BerthResult<()>;

    async fn remove_property(&self, _name: &str) -> BerthResult<()> {
        Err(BerthError::NotImplemented("remove_property"))
    }

    async fn info(&self) -> BerthResult<ContainerInfo> {
        Err(BerthError::NotImplemented("info"))
    }

    async fn metrics(&self) -> BerthResult<ContainerMetrics> {
        Err(BerthError::NotImplemented("metrics"))
    }

    async fn stream_in(&self, _spec: StreamInSpec) -> BerthResult<()> {
        Err(BerthError::NotImplemented("stream_in"))
    }

    async fn stream_out(&self, _spec: StreamOutSpec) -> BerthResult<IoReader> {
        Err(BerthError::NotImplemented("stream_out"))
    }

    async fn set_grace_time(&self, _grace_time: Duration) -> BerthResult<()> {
        Err(BerthError::NotImplemented("set_grace_time"))
    }

    async fn current_bandwidth_limits(&self) -> BerthResult<BandwidthLimits> {
        Err(BerthError::NotImplemented("current_bandwidth_limits"))
    }

    async fn current_cpu_limits(&self) -> BerthResult<CpuLimits> {
        Err(BerthError::NotImplemented("current_cpu_limits"))
    }

    async fn current_disk_limits(&self) -> BerthResult<DiskLimits> {
        Err(BerthError::NotImplemented("current_disk_limits"))
    }

    async fn current_memory_limits(&self) -> BerthResult<MemoryLimits> {
        Err(BerthError::NotImplemented("current_memory_limits"))
    }

    /// Map `host_port` to `container_port`; returns the mapped pair.
    async fn net_in(&self, _host_port: u32, _container_port: u32) -> BerthResult<(u32, u32)> {
        Err(BerthError::NotImplemented("net_in"))
    }

    async fn net_out(&self, _rule: NetOutRule) -> BerthResult<()> {
        Err(BerthError::NotImplemented("net_out"))
    }

    async fn bulk_net_out(&self, _rules: Vec<NetOutRule>) -> BerthResult<()> {
        Err(BerthError::NotImplemented("bulk_net_out"))
    }
}
