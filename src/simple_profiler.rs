//! Simple profiling macros using thread-local storage
//!
//! Lightweight timing of the hot paths without changing function signatures.
//! Enable with environment variable: PELLET_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Instrumented code paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    MoveGen,
    Eval,
    FloodFill,
    ApplyAction,
    AlphaBeta,
}

impl Category {
    const COUNT: usize = 5;

    const ALL: [Category; Category::COUNT] = [
        Category::MoveGen,
        Category::Eval,
        Category::FloodFill,
        Category::ApplyAction,
        Category::AlphaBeta,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Category::MoveGen => "Move Generation",
            Category::Eval => "Evaluation",
            Category::FloodFill => "Flood Fill",
            Category::ApplyAction => "Apply Action",
            Category::AlphaBeta => "Alpha-Beta Nodes",
        }
    }
}

thread_local! {
    static TIMES: RefCell<[u64; Category::COUNT]> = const { RefCell::new([0; Category::COUNT]) };
    static COUNTS: RefCell<[usize; Category::COUNT]> = const { RefCell::new([0; Category::COUNT]) };
    static CUTOFFS: RefCell<usize> = const { RefCell::new(0) };
}

// Global aggregators
static GLOBAL_TIMES: [AtomicU64; Category::COUNT] = [
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
];
static GLOBAL_COUNTS: [AtomicUsize; Category::COUNT] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];
static GLOBAL_CUTOFFS: AtomicUsize = AtomicUsize::new(0);

#[inline]
pub fn is_profiling_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("PELLET_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: Category,
}

impl ProfileGuard {
    pub fn new(category: Category) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        let slot = self.category.slot();
        TIMES.with(|t| t.borrow_mut()[slot] += elapsed_ns);
        COUNTS.with(|c| c.borrow_mut()[slot] += 1);
    }
}

#[inline]
pub fn record_alpha_beta_cutoff() {
    if is_profiling_enabled() {
        CUTOFFS.with(|c| *c.borrow_mut() += 1);
    }
}

/// Moves this thread's counters into the global aggregators
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    TIMES.with(|t| {
        let mut t = t.borrow_mut();
        for (global, local) in GLOBAL_TIMES.iter().zip(t.iter_mut()) {
            global.fetch_add(*local, Ordering::Relaxed);
            *local = 0;
        }
    });
    COUNTS.with(|c| {
        let mut c = c.borrow_mut();
        for (global, local) in GLOBAL_COUNTS.iter().zip(c.iter_mut()) {
            global.fetch_add(*local, Ordering::Relaxed);
            *local = 0;
        }
    });
    CUTOFFS.with(|c| {
        GLOBAL_CUTOFFS.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    for category in Category::ALL {
        let time = GLOBAL_TIMES[category.slot()].load(Ordering::Relaxed);
        let count = GLOBAL_COUNTS[category.slot()].load(Ordering::Relaxed);
        let ms = time as f64 / 1_000_000.0;
        let pct = if total_ns > 0 { 100.0 * time as f64 / total_ns as f64 } else { 0.0 };
        let avg_us = if count > 0 { time as f64 / (count * 1000) as f64 } else { 0.0 };

        eprintln!("{}:", category.label());
        eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
        eprintln!("  Calls:    {}", count);
        eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
    }

    let nodes = GLOBAL_COUNTS[Category::AlphaBeta.slot()].load(Ordering::Relaxed);
    let cutoffs = GLOBAL_CUTOFFS.load(Ordering::Relaxed);
    let cutoff_rate = if nodes > 0 { 100.0 * cutoffs as f64 / nodes as f64 } else { 0.0 };
    eprintln!("Cutoffs: {} ({:.1}% of nodes)", cutoffs, cutoff_rate);

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}
