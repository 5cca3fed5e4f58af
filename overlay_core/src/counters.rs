//! Performance counter session
//!
//! A [`CounterSession`] owns one query context and the two counters registered
//! against it. The query contract itself (open, add counter, collect, read,
//! close) sits behind [`PerfQuery`] so the session logic does not care which
//! OS facility serves the numbers.

use std::collections::HashMap;
use std::fmt;

use log::{debug, error, info, warn};
use sysinfo::System;

use crate::constants::counters::{CPU_SENTINEL, CPU_TOTAL_PATH, DISK_TOTAL_PATH};
use crate::error::{CounterStep, OverlayError, Result};

/// Status code returned by a query backend call
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterStatus(pub u32);

impl CounterStatus {
    pub const SUCCESS: Self = Self(0x0000_0000);
    pub const NO_DATA: Self = Self(0x8000_07D5);
    pub const NO_OBJECT: Self = Self(0xC000_0BB8);
    pub const NO_COUNTER: Self = Self(0xC000_0BB9);
    pub const INVALID_DATA: Self = Self(0xC000_0BBA);
    pub const INVALID_HANDLE: Self = Self(0xC000_0BBC);

    pub fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CounterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl fmt::Debug for CounterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CounterStatus(0x{:08X})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterHandle(pub u32);

/// The performance-query contract consumed by [`CounterSession`].
///
/// Counter handles returned by `add_counter` belong to the query they were
/// added to and become invalid once that query is closed.
pub trait PerfQuery {
    fn open_query(&mut self) -> std::result::Result<QueryHandle, CounterStatus>;

    fn add_counter(
        &mut self,
        query: QueryHandle,
        path: &str,
    ) -> std::result::Result<CounterHandle, CounterStatus>;

    fn collect(&mut self, query: QueryHandle) -> std::result::Result<(), CounterStatus>;

    /// Reads the last collected value formatted as an integer.
    fn formatted_value(&mut self, counter: CounterHandle) -> std::result::Result<i32, CounterStatus>;

    /// Releases the query together with every counter added to it.
    fn close_query(&mut self, query: QueryHandle);
}

#[derive(Debug, Clone, Copy)]
struct OpenHandles {
    query: QueryHandle,
    cpu: CounterHandle,
    // 仅为与三步打开流程保持一致而注册，显示不读取
    #[allow(dead_code)]
    disk: CounterHandle,
}

/// One query context with the CPU and disk counters registered against it.
///
/// The handles are stored together, so a half-opened session is never
/// observable: either all three exist or none does.
pub struct CounterSession<Q: PerfQuery> {
    backend: Q,
    handles: Option<OpenHandles>,
}

impl<Q: PerfQuery> CounterSession<Q> {
    pub fn new(backend: Q) -> Self {
        Self {
            backend,
            handles: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.handles.is_some()
    }

    pub fn backend(&self) -> &Q {
        &self.backend
    }

    /// Opens the query and registers both counters.
    ///
    /// A failure while adding a counter closes the query before returning.
    pub fn open(&mut self) -> Result<()> {
        if self.handles.is_some() {
            debug!("Counter session already open");
            return Ok(());
        }

        let query = match self.backend.open_query() {
            Ok(query) => query,
            Err(status) => {
                error!("Failed to open query. Error code: {}", status);
                return Err(OverlayError::counter(CounterStep::OpenQuery, status));
            }
        };

        let cpu = match self.backend.add_counter(query, CPU_TOTAL_PATH) {
            Ok(counter) => counter,
            Err(status) => {
                error!("Failed to add counter. Error code: {}", status);
                self.backend.close_query(query);
                return Err(OverlayError::counter(CounterStep::AddCpuCounter, status));
            }
        };

        let disk = match self.backend.add_counter(query, DISK_TOTAL_PATH) {
            Ok(counter) => counter,
            Err(status) => {
                error!("Failed to add disk counter. Error code: {}", status);
                self.backend.close_query(query);
                return Err(OverlayError::counter(CounterStep::AddDiskCounter, status));
            }
        };

        // 速率型计数器需要两次采集才有有效值，这里先采集一次作为基线
        if let Err(status) = self.backend.collect(query) {
            warn!("Initial counter collection failed. Error code: {}", status);
        }

        self.handles = Some(OpenHandles { query, cpu, disk });
        info!("Counter session opened: {:?}", query);
        Ok(())
    }

    /// Collects fresh data and returns CPU utilization in whole percent.
    ///
    /// Returns [`CPU_SENTINEL`] when the session is not open or the backend
    /// fails for this tick.
    pub fn sample_cpu(&mut self) -> i32 {
        let Some(handles) = self.handles else {
            return CPU_SENTINEL;
        };

        if let Err(status) = self.backend.collect(handles.query) {
            debug!("Collect failed: {}", status);
            return CPU_SENTINEL;
        }

        match self.backend.formatted_value(handles.cpu) {
            Ok(value) => value,
            Err(status) => {
                debug!("Reading cpu counter failed: {}", status);
                CPU_SENTINEL
            }
        }
    }

    /// Releases the query. Calling this on a closed session does nothing.
    pub fn close(&mut self) {
        if let Some(handles) = self.handles.take() {
            self.backend.close_query(handles.query);
            info!("Counter session closed: {:?}", handles.query);
        }
    }
}

impl<Q: PerfQuery> Drop for CounterSession<Q> {
    fn drop(&mut self) {
        self.close();
    }
}

// ================= sysinfo 后端 =================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterKind {
    CpuTotal,
    DiskTotal,
}

impl CounterKind {
    fn from_path(path: &str) -> Option<Self> {
        if path.eq_ignore_ascii_case(CPU_TOTAL_PATH) {
            Some(Self::CpuTotal)
        } else if path.eq_ignore_ascii_case(DISK_TOTAL_PATH) {
            Some(Self::DiskTotal)
        } else {
            None
        }
    }
}

struct OpenQuery {
    handle: QueryHandle,
    system: System,
    collections: u64,
}

/// [`PerfQuery`] served by `sysinfo`.
///
/// Holds at most one query at a time. The CPU counter reports the global CPU
/// usage; the disk counter resolves but has no data source and reads as
/// [`CounterStatus::NO_DATA`].
pub struct SysinfoQuery {
    query: Option<OpenQuery>,
    counters: HashMap<CounterHandle, CounterKind>,
    next_handle: u32,
}

impl SysinfoQuery {
    pub fn new() -> Self {
        Self {
            query: None,
            counters: HashMap::new(),
            next_handle: 1,
        }
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        handle
    }

    fn open_query_mut(
        &mut self,
        query: QueryHandle,
    ) -> std::result::Result<&mut OpenQuery, CounterStatus> {
        match self.query.as_mut() {
            Some(open) if open.handle == query => Ok(open),
            _ => Err(CounterStatus::INVALID_HANDLE),
        }
    }
}

impl Default for SysinfoQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfQuery for SysinfoQuery {
    fn open_query(&mut self) -> std::result::Result<QueryHandle, CounterStatus> {
        if self.query.is_some() {
            return Err(CounterStatus::INVALID_HANDLE);
        }
        let handle = QueryHandle(self.allocate());
        self.query = Some(OpenQuery {
            handle,
            system: System::new(),
            collections: 0,
        });
        Ok(handle)
    }

    fn add_counter(
        &mut self,
        query: QueryHandle,
        path: &str,
    ) -> std::result::Result<CounterHandle, CounterStatus> {
        self.open_query_mut(query)?;
        let kind = CounterKind::from_path(path).ok_or(CounterStatus::NO_OBJECT)?;
        let handle = CounterHandle(self.allocate());
        self.counters.insert(handle, kind);
        Ok(handle)
    }

    fn collect(&mut self, query: QueryHandle) -> std::result::Result<(), CounterStatus> {
        let open = self.open_query_mut(query)?;
        open.system.refresh_cpu_usage();
        open.collections += 1;
        Ok(())
    }

    fn formatted_value(&mut self, counter: CounterHandle) -> std::result::Result<i32, CounterStatus> {
        let kind = *self
            .counters
            .get(&counter)
            .ok_or(CounterStatus::INVALID_HANDLE)?;
        let open = self.query.as_ref().ok_or(CounterStatus::INVALID_HANDLE)?;

        match kind {
            CounterKind::CpuTotal => {
                if open.collections == 0 {
                    return Err(CounterStatus::INVALID_DATA);
                }
                // 与 PDH_FMT_LONG 一致：截断为整数
                Ok(open.system.global_cpu_usage() as i32)
            }
            CounterKind::DiskTotal => Err(CounterStatus::NO_DATA),
        }
    }

    fn close_query(&mut self, query: QueryHandle) {
        if self.query.as_ref().is_some_and(|open| open.handle == query) {
            self.query = None;
            self.counters.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_displays_as_hex_code() {
        assert_eq!(CounterStatus::NO_OBJECT.to_string(), "0xC0000BB8");
        assert_eq!(CounterStatus::SUCCESS.to_string(), "0x00000000");
        assert_eq!(CounterStatus::NO_DATA.code(), 0x8000_07D5);
    }

    #[test]
    fn counter_paths_resolve_case_insensitively() {
        assert_eq!(
            CounterKind::from_path(r"\processor(_total)\% processor time"),
            Some(CounterKind::CpuTotal)
        );
        assert_eq!(
            CounterKind::from_path(DISK_TOTAL_PATH),
            Some(CounterKind::DiskTotal)
        );
        assert_eq!(CounterKind::from_path(r"\Memory\Available Bytes"), None);
    }

    #[test]
    fn sysinfo_query_rejects_unknown_path() {
        let mut backend = SysinfoQuery::new();
        let query = backend.open_query().unwrap();
        assert_eq!(
            backend.add_counter(query, r"\Network Interface(*)\Bytes Total/sec"),
            Err(CounterStatus::NO_OBJECT)
        );
    }

    #[test]
    fn sysinfo_query_allows_one_open_query() {
        let mut backend = SysinfoQuery::new();
        let query = backend.open_query().unwrap();
        assert_eq!(backend.open_query(), Err(CounterStatus::INVALID_HANDLE));

        backend.close_query(query);
        assert!(backend.open_query().is_ok());
    }

    #[test]
    fn sysinfo_query_invalidates_counters_on_close() {
        let mut backend = SysinfoQuery::new();
        let query = backend.open_query().unwrap();
        let cpu = backend.add_counter(query, CPU_TOTAL_PATH).unwrap();
        backend.collect(query).unwrap();
        assert!(backend.formatted_value(cpu).is_ok());

        backend.close_query(query);
        assert_eq!(backend.collect(query), Err(CounterStatus::INVALID_HANDLE));
        assert_eq!(
            backend.formatted_value(cpu),
            Err(CounterStatus::INVALID_HANDLE)
        );
    }

    #[test]
    fn sysinfo_cpu_counter_needs_a_collection() {
        let mut backend = SysinfoQuery::new();
        let query = backend.open_query().unwrap();
        let cpu = backend.add_counter(query, CPU_TOTAL_PATH).unwrap();
        assert_eq!(
            backend.formatted_value(cpu),
            Err(CounterStatus::INVALID_DATA)
        );

        backend.collect(query).unwrap();
        let value = backend.formatted_value(cpu).unwrap();
        assert!(value >= 0, "cpu usage should not be negative: {}", value);
    }

    #[test]
    fn sysinfo_disk_counter_has_no_data() {
        let mut backend = SysinfoQuery::new();
        let query = backend.open_query().unwrap();
        let disk = backend.add_counter(query, DISK_TOTAL_PATH).unwrap();
        backend.collect(query).unwrap();
        assert_eq!(backend.formatted_value(disk), Err(CounterStatus::NO_DATA));
    }

    #[test]
    fn session_over_sysinfo_opens_and_samples() {
        let mut session = CounterSession::new(SysinfoQuery::new());
        session.open().unwrap();
        assert!(session.is_open());

        let cpu = session.sample_cpu();
        assert!(cpu >= 0);

        session.close();
        assert!(!session.is_open());
        assert_eq!(session.sample_cpu(), CPU_SENTINEL);
    }
}
