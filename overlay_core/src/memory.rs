//! Physical memory sampling

use log::debug;
use sysinfo::System;

/// Raw answer of one memory-status query, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStatus {
    pub total: u64,
    pub available: u64,
}

impl MemoryStatus {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

/// Derived usage shown on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
}

/// Something that can answer a memory-status query in a single call.
pub trait MemorySource {
    fn query(&mut self) -> Option<MemoryStatus>;
}

/// [`MemorySource`] backed by `sysinfo`
pub struct SysinfoMemory {
    system: System,
}

impl SysinfoMemory {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource for SysinfoMemory {
    fn query(&mut self) -> Option<MemoryStatus> {
        self.system.refresh_memory();
        Some(MemoryStatus {
            total: self.system.total_memory(),
            available: self.system.available_memory(),
        })
    }
}

pub struct MemorySampler<S: MemorySource> {
    source: S,
}

impl<S: MemorySource> MemorySampler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns total and used physical memory, or `None` when the query
    /// failed or came back inconsistent.
    pub fn sample(&mut self) -> Option<MemoryUsage> {
        let status = self.source.query()?;
        if status.total == 0 || status.available > status.total {
            debug!("Discarding memory status: {:?}", status);
            return None;
        }
        Some(MemoryUsage {
            total: status.total,
            used: status.used(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<MemoryStatus>);

    impl MemorySource for Fixed {
        fn query(&mut self) -> Option<MemoryStatus> {
            self.0
        }
    }

    #[test]
    fn used_is_total_minus_available() {
        let pairs = [(0u64, 0u64), (100, 0), (100, 100), (16 << 30, 10 << 30), (u64::MAX, 1)];
        for (total, available) in pairs {
            let status = MemoryStatus { total, available };
            assert_eq!(status.used(), total - available);
            assert!(status.used() <= total);
        }
    }

    #[test]
    fn used_saturates_when_available_exceeds_total() {
        let status = MemoryStatus {
            total: 10,
            available: 20,
        };
        assert_eq!(status.used(), 0);
    }

    #[test]
    fn sampler_derives_used() {
        let mut sampler = MemorySampler::new(Fixed(Some(MemoryStatus {
            total: 16 << 30,
            available: 10 << 30,
        })));
        assert_eq!(
            sampler.sample(),
            Some(MemoryUsage {
                total: 16 << 30,
                used: 6 << 30,
            })
        );
    }

    #[test]
    fn sampler_treats_bad_answers_as_unknown() {
        assert_eq!(MemorySampler::new(Fixed(None)).sample(), None);
        assert_eq!(
            MemorySampler::new(Fixed(Some(MemoryStatus {
                total: 0,
                available: 0
            })))
            .sample(),
            None
        );
        assert_eq!(
            MemorySampler::new(Fixed(Some(MemoryStatus {
                total: 4,
                available: 8
            })))
            .sample(),
            None
        );
    }

    #[test]
    fn sysinfo_reports_physical_memory() {
        let mut sampler = MemorySampler::new(SysinfoMemory::new());
        let usage = sampler.sample().expect("memory status should be available");
        assert!(usage.total > 0);
        assert!(usage.used <= usage.total);
    }
}
