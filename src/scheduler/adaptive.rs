//! # Adaptive Scheduler (I+PI Regulator)
//!
//! Two nested control loops tune per-task CPU-time bursts: an inner
//! integrator per task drives each task's measured burst toward its
//! share of the round, and an outer proportional-integral loop on total
//! round time keeps system throughput tracking a setpoint despite ISR
//! jitter and variable yields. See Leva, Maggio, Papadopulos & Terraneo,
//! *Control-Based Operating System Design*, §5.2, Algorithm 5.1.
//!
//! This is a from-scratch regulator following that algorithm; it is not
//! a port of any one existing scheduler file, though the round/burst
//! bookkeeping below mirrors the shape of the cooperative scheduler's
//! pool-index tracking.

use crate::config::{
    AS_BURST_MAX_US, AS_BURST_MIN_US, AS_BURST_NOMINAL_US, AS_IDLE_THREAD_BURST_US, AS_K_RR,
    AS_MULT_FACTOR, AS_Z_RR,
};
use crate::task::Tcb;
use crate::timer::{PreemptionTimer, TimerHandle};

use super::{OnSwitch, Scheduler};

fn burst_min_scaled() -> i32 {
    (AS_BURST_MIN_US as f32 * AS_MULT_FACTOR) as i32
}

fn burst_max_scaled() -> i32 {
    (AS_BURST_MAX_US as f32 * AS_MULT_FACTOR) as i32
}

fn clamp_burst(burst: i32) -> i32 {
    burst.clamp(burst_min_scaled(), burst_max_scaled())
}

pub struct AdaptiveScheduler {
    pool: Option<&'static mut [Tcb]>,
    idle: Option<&'static mut Tcb>,
    on_switch: Option<OnSwitch>,
    timer: Option<&'static mut dyn PreemptionTimer>,
    timer_handle: Option<TimerHandle>,

    /// Index of the last-dispatched pool task; -1 before the first call
    /// so that the first advance lands on slot 0.
    current_task: i32,
    task_is_idle: bool,
    all_ready_saturated: bool,
    reinit_regulator: bool,

    t_round: u32,
    t_round_set_point: u32,
    bc_old: i32,
    err_round_old: i32,
}

impl AdaptiveScheduler {
    pub const fn new() -> Self {
        Self {
            pool: None,
            idle: None,
            on_switch: None,
            timer: None,
            timer_handle: None,
            current_task: -1,
            task_is_idle: true,
            all_ready_saturated: false,
            reinit_regulator: true,
            t_round: 0,
            t_round_set_point: 0,
            bc_old: 0,
            err_round_old: 0,
        }
    }

    /// Bind the preemption timer this scheduler arms on every dispatch.
    /// Must be called before `init`.
    pub fn set_timer(&mut self, timer: &'static mut dyn PreemptionTimer, handle: TimerHandle) {
        self.timer = Some(timer);
        self.timer_handle = Some(handle);
    }

    fn arm(&mut self, burst_us: u32) {
        let timer = self.timer.as_mut().expect("scheduler not initialized");
        let handle = self.timer_handle.expect("scheduler not initialized");
        timer.start(handle, burst_us);
    }

    fn elapsed_us(&self) -> u32 {
        let timer = self.timer.as_ref().expect("scheduler not initialized");
        let handle = self.timer_handle.expect("scheduler not initialized");
        timer.elapsed_us(handle)
    }

    /// Scan the pool once: does any Ready task exist, and if so, have all
    /// Ready tasks' burst already saturated at the upper clamp? Computed
    /// honestly (the regulator update reads this every round) rather than
    /// left permanently false.
    fn scan_pool(&self) -> (bool, bool) {
        let pool = self.pool.as_ref().expect("scheduler not initialized");
        let mut any_ready = false;
        let mut all_saturated = true;
        for task in pool.iter() {
            if task.is_ready() {
                any_ready = true;
                if task.adaptive.t_burst_old < burst_max_scaled() {
                    all_saturated = false;
                }
            }
        }
        (any_ready, any_ready && all_saturated)
    }

    /// Regulator update, run once per completed round.
    fn run_regulator(&mut self) {
        let pool = self.pool.as_mut().expect("scheduler not initialized");
        let n_tasks = pool.len() as u32;

        if self.reinit_regulator {
            self.reinit_regulator = false;
            self.t_round = 0;
            self.err_round_old = 0;
            self.bc_old = 0;

            for task in pool.iter_mut() {
                let set_point = (task.adaptive.alpha * self.t_round_set_point as f32) as u32;
                task.adaptive.t_process_set_point = set_point;
                task.adaptive.t_burst_old = clamp_burst((set_point as f32 * AS_MULT_FACTOR) as i32);
            }
            return;
        }

        let err_round = self.t_round_set_point as i32 - self.t_round as i32;
        let mut burst_correction = self.bc_old
            + ((AS_K_RR * err_round as f32) - (AS_K_RR * AS_Z_RR * self.err_round_old as f32)) as i32;

        if self.all_ready_saturated {
            self.all_ready_saturated = false;
            if burst_correction < self.bc_old {
                self.bc_old = burst_correction;
            }
        } else {
            self.bc_old = burst_correction;
        }

        burst_correction = self.bc_old;
        let lower = -(self.t_round as i32);
        let upper = AS_BURST_MAX_US as i32 * n_tasks as i32;
        self.bc_old = burst_correction.clamp(lower, upper);

        let next_round_time = (self.t_round as i32 + self.bc_old) as f32;
        self.err_round_old = err_round;
        self.t_round = 0;

        for task in pool.iter_mut() {
            let a = &mut task.adaptive;
            a.t_process_set_point = (a.alpha * next_round_time) as u32;
            let error_t_process = a.t_process_set_point as i32 - a.t_process as i32;
            let burst = a.t_burst_old + error_t_process;
            a.t_burst_old = clamp_burst(burst);
        }
    }

    /// Implements the `yield()` algorithm: measure the outgoing burst,
    /// advance to the next Ready task (running the regulator on every
    /// round boundary), and arm the preemption timer for the winner.
    fn find_next(&mut self) -> *mut Tcb {
        if !self.task_is_idle {
            let t_process = self.elapsed_us();
            let idx = self.current_task;
            if idx >= 0 {
                let pool = self.pool.as_mut().expect("scheduler not initialized");
                let idx = idx as usize;
                pool[idx].adaptive.t_process = t_process;
                self.t_round += t_process;
            }
        } else {
            self.task_is_idle = false;
        }

        let len = self.pool.as_ref().expect("scheduler not initialized").len() as i32;
        let mut idx = self.current_task + 1;

        loop {
            if idx == len {
                let (any_ready, all_saturated) = self.scan_pool();
                if !any_ready {
                    self.arm(AS_IDLE_THREAD_BURST_US);
                    self.task_is_idle = true;
                    return self.idle.as_deref_mut().expect("scheduler not initialized") as *mut Tcb;
                }
                self.all_ready_saturated = all_saturated;
                idx = 0;
                self.run_regulator();
            }

            let pool = self.pool.as_mut().expect("scheduler not initialized");
            let slot = &mut pool[idx as usize];
            if slot.is_ready() {
                self.current_task = idx;
                let next_burst_us = (slot.adaptive.t_burst_old as f32 / AS_MULT_FACTOR) as u32;
                self.arm(next_burst_us);
                return slot as *mut Tcb;
            }
            slot.adaptive.t_process = 0;
            idx += 1;
        }
    }
}

impl Scheduler for AdaptiveScheduler {
    fn init(&mut self, pool: &'static mut [Tcb], idle: &'static mut Tcb, on_switch: OnSwitch) {
        let priority_sum: u32 = pool.iter().map(|t| t.priority() as u32 + 1).sum();
        let n_tasks = pool.len() as u32;

        for task in pool.iter_mut() {
            task.adaptive.t_burst_old = (AS_BURST_NOMINAL_US as f32 * AS_MULT_FACTOR) as i32;
            task.adaptive.alpha = (task.priority() as u32 + 1) as f32 / priority_sum as f32;
        }

        self.pool = Some(pool);
        self.idle = Some(idle);
        self.on_switch = Some(on_switch);
        self.current_task = -1;
        self.task_is_idle = true;
        self.all_ready_saturated = false;
        self.reinit_regulator = true;
        self.t_round = 0;
        self.t_round_set_point = n_tasks * AS_BURST_NOMINAL_US;
        self.bc_old = 0;
        self.err_round_old = 0;
    }

    fn yield_task(&mut self) {
        let next = self.find_next();
        (self.on_switch.expect("scheduler not initialized"))(next);
    }

    fn get_next(&mut self) -> *mut Tcb {
        self.find_next()
    }
}
