//! Cenários do escalonador na plataforma hosted.
//!
//! Cada teste cria um `Scheduler` próprio (vazado) e um alocador de
//! unidades próprio. A troca de contexto simulada retorna na hora: depois
//! de `launch`/`yield_now` o teste passa a agir como a thread escolhida.

use std::boxed::Box;
use std::vec::Vec;

use core::sync::atomic::{AtomicUsize, Ordering};

use super::debug::{DumpLists, ListKind, ThreadInfo};
use super::entry::run_thread_body;
use super::idle::idle_pass;
use super::scheduler::Scheduler;
use super::sleep_queue::SweepStep;
use crate::arch::hosted;
use crate::arch::traits::CpuOps;
use crate::arch::Cpu;
use crate::mm::units::leak_test_units;
use crate::mm::HeapUnits;
use crate::sched::config::{ReadyPolicy, SchedConfig, MAX_THREADS, PRIORITY_DEFAULT};
use crate::sched::thread::{unit, ThreadRef, ThreadStatus};
use crate::sync::Spinlock;
use crate::sys::{CoreId, Errno};

fn nop(_: usize) {}

fn bump(arg: usize) {
    let counter = unsafe { &*(arg as *const AtomicUsize) };
    counter.fetch_add(1, Ordering::SeqCst);
}

fn boot_with(cpus: usize, units: usize, policy: ReadyPolicy) -> (&'static Scheduler, &'static HeapUnits) {
    hosted::reset_cpu(0, false);
    let sched: &'static Scheduler = Box::leak(Box::new(Scheduler::new()));
    let units = leak_test_units(units);
    sched.init(SchedConfig::new(cpus).with_policy(policy), units);
    (sched, units)
}

fn boot(cpus: usize) -> (&'static Scheduler, &'static HeapUnits) {
    boot_with(cpus, 16, ReadyPolicy::PerCore)
}

fn spawn(sched: &'static Scheduler, name: &str) -> ThreadRef {
    sched
        .create(name, PRIORITY_DEFAULT, nop, 0)
        .expect("create")
}

fn list(sched: &Scheduler, kind: ListKind) -> Vec<ThreadInfo> {
    let mut out = Vec::new();
    sched.enumerate(kind, |info| out.push(info));
    out
}

fn tids(sched: &Scheduler, kind: ListKind) -> Vec<u64> {
    list(sched, kind).iter().map(|info| info.tid.as_u64()).collect()
}

fn status(sched: &Scheduler, thread: ThreadRef) -> ThreadStatus {
    sched.thread_info(thread).expect("thread viva").status
}

// =============================================================================
// CRIAÇÃO
// =============================================================================

#[test]
fn create_links_thread_into_all_and_one_ready_list() {
    let (sched, _) = boot(2);
    let a = spawn(sched, "a");

    let in_all = tids(sched, ListKind::All)
        .iter()
        .filter(|tid| **tid == a.tid().as_u64())
        .count();
    assert_eq!(in_all, 1);

    let in_ready: usize = (0..2)
        .map(|core| {
            tids(sched, ListKind::Ready(CoreId(core)))
                .iter()
                .filter(|tid| **tid == a.tid().as_u64())
                .count()
        })
        .sum();
    assert_eq!(in_ready, 1);
    assert_eq!(status(sched, a), ThreadStatus::Ready);

    // idle: uma por núcleo, na lista geral e fora das filas de prontos
    let idles: Vec<_> = list(sched, ListKind::All)
        .into_iter()
        .filter(|info| info.idle)
        .collect();
    assert_eq!(idles.len(), 2);
    assert_eq!(idles[0].tid.as_u64(), 1);
    assert_eq!(idles[1].tid.as_u64(), 2);
}

#[test]
fn thread_ids_are_unique_and_increasing() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    let c = spawn(sched, "c");

    assert_eq!(a.tid().as_u64(), 2);
    assert!(a.tid() < b.tid());
    assert!(b.tid() < c.tid());
    assert_eq!(sched.live_threads(), 4);
}

#[test]
fn create_without_units_fails_with_enomem() {
    let (sched, units) = boot_with(1, 2, ReadyPolicy::PerCore);
    spawn(sched, "a");

    assert_eq!(sched.create("b", PRIORITY_DEFAULT, nop, 0), Err(Errno::ENOMEM));
    assert_eq!(sched.live_threads(), 2);
    assert_eq!(tids(sched, ListKind::Ready(CoreId::BSP)).len(), 1);
    assert_eq!(units.stats().failed, 1);
}

#[test]
fn create_with_full_table_fails_with_eagain_and_frees_unit() {
    let (sched, units) = boot_with(1, MAX_THREADS + 6, ReadyPolicy::PerCore);
    for _ in 1..MAX_THREADS {
        spawn(sched, "filler");
    }

    assert_eq!(sched.create("extra", PRIORITY_DEFAULT, nop, 0), Err(Errno::EAGAIN));
    assert_eq!(sched.live_threads(), MAX_THREADS);
    assert_eq!(units.stats().in_use(), MAX_THREADS);
}

#[test]
fn long_names_are_truncated() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "um-nome-bem-maior-que-o-limite");
    let info = sched.thread_info(a).expect("info");
    assert_eq!(info.name.as_str(), "um-nome-bem-maio");
}

#[test]
fn new_thread_context_carries_entry_and_arg() {
    let (sched, _) = boot(1);
    let a = sched
        .create("ctx", PRIORITY_DEFAULT, bump, 0xC0FFEE)
        .expect("create");

    let ctx = sched.saved_context(a).expect("ctx");
    assert_eq!(ctx.resume_at, hosted::RESUME_IN_TRAMPOLINE);
    assert_eq!(ctx.args[0], sched as *const Scheduler as u64);
    assert_eq!(ctx.args[1], bump as fn(usize) as usize as u64);
    assert_eq!(ctx.args[2], 0xC0FFEE);
}

// =============================================================================
// START / YIELD
// =============================================================================

#[test]
fn launch_runs_first_ready_thread() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");

    sched.launch();

    assert_eq!(sched.current(), Some(a));
    assert_eq!(status(sched, a), ThreadStatus::Running);
    assert_eq!(status(sched, b), ThreadStatus::Ready);
    let running = list(sched, ListKind::All)
        .iter()
        .filter(|info| info.status == ThreadStatus::Running)
        .count();
    assert_eq!(running, 1);
    assert!(sched.cpus.get().is_online());
}

#[test]
fn launch_without_threads_runs_idle() {
    let (sched, _) = boot(1);
    sched.launch();

    let current = sched.current().expect("current");
    assert!(sched.thread_info(current).expect("idle").idle);
}

#[test]
fn yield_cycles_ready_threads_in_fifo_order() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    let c = spawn(sched, "c");
    sched.launch();

    let mut order = Vec::new();
    for _ in 0..6 {
        order.push(sched.current().expect("current"));
        sched.yield_now();
    }

    assert_eq!(order, [a, b, c, a, b, c]);
    assert_eq!(status(sched, a), ThreadStatus::Running);
    assert_eq!(tids(sched, ListKind::Ready(CoreId::BSP)), [b.tid().as_u64(), c.tid().as_u64()]);
}

#[test]
fn yield_alone_keeps_running() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    sched.launch();
    let switches = hosted::switch_count();

    sched.yield_now();

    assert_eq!(sched.current(), Some(a));
    assert_eq!(status(sched, a), ThreadStatus::Running);
    assert_eq!(hosted::switch_count(), switches);
    assert!(tids(sched, ListKind::Ready(CoreId::BSP)).is_empty());
}

#[test]
fn yield_saves_outgoing_context() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    spawn(sched, "b");
    sched.launch();

    let before = sched.saved_context(a).expect("ctx");
    assert_eq!(before.resume_at, hosted::RESUME_IN_TRAMPOLINE);

    sched.yield_now();

    let after = sched.saved_context(a).expect("ctx");
    assert_eq!(after.resume_at, hosted::RESUME_IN_SWITCH);
    assert_eq!(after.saves, 1);
}

// =============================================================================
// BLOCK / UNBLOCK
// =============================================================================

#[test]
fn block_then_unblock_resumes_with_same_context() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    sched.launch();

    sched.block();
    assert_eq!(sched.current(), Some(b));
    assert_eq!(status(sched, a), ThreadStatus::Blocked);
    let parked = sched.saved_context(a).expect("ctx");

    sched.yield_now();
    sched.tick();
    // ninguém mais pronto: B continua
    assert_eq!(sched.current(), Some(b));
    assert_eq!(sched.saved_context(a), Some(parked));

    sched.unblock(a);
    assert_eq!(status(sched, a), ThreadStatus::Ready);
    assert_eq!(tids(sched, ListKind::Ready(CoreId::BSP)), [a.tid().as_u64()]);

    sched.yield_now();
    assert_eq!(sched.current(), Some(a));
    assert_eq!(sched.saved_context(a), Some(parked));
    assert!(!Cpu::are_interrupts_enabled());
}

#[test]
fn block_with_nothing_ready_falls_back_to_idle() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    sched.launch();

    sched.block();

    let current = sched.current().expect("current");
    assert!(sched.thread_info(current).expect("idle").idle);

    sched.unblock(a);
    idle_pass(sched);
    assert_eq!(sched.current(), Some(a));
    assert!(Cpu::are_interrupts_enabled());
}

#[test]
fn idle_pass_without_work_stays_on_idle() {
    let (sched, _) = boot(1);
    sched.launch();
    let idle = sched.current();

    idle_pass(sched);

    assert_eq!(sched.current(), idle);
    assert_eq!(status(sched, idle.expect("idle")), ThreadStatus::Running);
}

#[test]
#[should_panic]
fn unblock_of_ready_thread_is_fatal() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    sched.unblock(a);
}

#[test]
#[should_panic]
fn unblock_of_stale_handle_is_fatal() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    spawn(sched, "b");
    sched.launch();
    sched.retire_current();

    sched.unblock(a);
}

#[test]
fn unblock_returns_thread_to_home_core() {
    let (sched, _) = boot(2);
    // idles têm TID 1 e 2: a=3 (núcleo 1), b=4 (núcleo 0), c=5 (núcleo 1)
    let a = spawn(sched, "a");
    spawn(sched, "b");
    let c = spawn(sched, "c");

    hosted::set_current_core(1);
    sched.launch();
    assert_eq!(sched.current(), Some(a));
    sched.block();
    assert_eq!(sched.current(), Some(c));

    hosted::set_current_core(0);
    sched.unblock(a);

    assert_eq!(tids(sched, ListKind::Ready(CoreId(1))), [a.tid().as_u64()]);
    assert!(!tids(sched, ListKind::Ready(CoreId(0))).contains(&a.tid().as_u64()));
}

// =============================================================================
// SLEEP / TICK
// =============================================================================

#[test]
fn sleep_wakes_after_exactly_n_ticks() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    sched.launch();

    sched.sleep(3);
    assert_eq!(sched.current(), Some(b));
    assert_eq!(tids(sched, ListKind::Sleep), [a.tid().as_u64()]);

    sched.tick();
    sched.tick();
    assert_eq!(status(sched, a), ThreadStatus::Blocked);
    assert_eq!(sched.thread_info(a).expect("a").sleep_ticks, 1);

    sched.tick();
    assert_eq!(status(sched, a), ThreadStatus::Ready);
    assert!(tids(sched, ListKind::Sleep).is_empty());
    assert_eq!(tids(sched, ListKind::Ready(CoreId::BSP)), [a.tid().as_u64()]);
    assert_eq!(sched.ticks(), 3);
}

#[test]
fn sleep_of_zero_or_negative_ticks_does_nothing() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    spawn(sched, "b");
    sched.launch();

    sched.sleep(0);
    sched.sleep(-5);

    assert_eq!(sched.current(), Some(a));
    assert_eq!(status(sched, a), ThreadStatus::Running);
    assert!(tids(sched, ListKind::Sleep).is_empty());
}

#[test]
fn sleep_ms_rounds_up_to_whole_ticks() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    spawn(sched, "b");
    sched.launch();

    sched.sleep_ms(15);

    assert_eq!(sched.thread_info(a).expect("a").sleep_ticks, 2);
}

#[test]
fn unblock_cancels_pending_sleep() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    spawn(sched, "b");
    sched.launch();
    sched.sleep(10);

    sched.unblock(a);
    assert!(tids(sched, ListKind::Sleep).is_empty());

    for _ in 0..12 {
        sched.tick();
    }
    assert_eq!(tids(sched, ListKind::Ready(CoreId::BSP)), [a.tid().as_u64()]);
}

#[test]
fn expired_sleeper_is_claimed_under_sleep_lock() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    sched.launch();
    sched.sleep(1);
    assert_eq!(sched.current(), Some(b));

    // Varredura parada entre o passo que expira e o enfileiramento
    sched.sleep.lock().begin_sweep();
    let step = sched.sleep.lock().sweep_step(&sched.table);
    assert_eq!(step, SweepStep::Expired(a));
    assert_eq!(status(sched, a), ThreadStatus::Ready);
    assert!(tids(sched, ListKind::Ready(CoreId::BSP)).is_empty());

    sched.wake_expired(a);
    assert_eq!(tids(sched, ListKind::Ready(CoreId::BSP)), [a.tid().as_u64()]);
}

#[test]
fn stale_expired_handle_does_not_touch_reused_slot() {
    let (sched, _) = boot(1);
    let x = spawn(sched, "x");
    let y = spawn(sched, "y");
    sched.launch();
    assert_eq!(sched.current(), Some(x));

    // x sai e o slot dela vai para d
    sched.retire_current();
    assert_eq!(sched.current(), Some(y));
    let d = spawn(sched, "d");
    assert_eq!(d.slot(), x.slot());
    assert_ne!(d.tid(), x.tid());

    sched.yield_now();
    assert_eq!(sched.current(), Some(d));
    sched.sleep(5);
    assert_eq!(sched.current(), Some(y));

    sched.wake_expired(x);
    assert_eq!(status(sched, d), ThreadStatus::Blocked);
    assert!(tids(sched, ListKind::Ready(CoreId::BSP)).is_empty());

    assert!(!sched.sleep.lock().cancel(&sched.table, x));
    assert_eq!(tids(sched, ListKind::Sleep), [d.tid().as_u64()]);

    sched.unblock(d);
    assert!(tids(sched, ListKind::Sleep).is_empty());
    assert_eq!(tids(sched, ListKind::Ready(CoreId::BSP)), [d.tid().as_u64()]);
}

#[test]
fn tick_outside_timekeeper_core_is_ignored() {
    let (sched, _) = boot(2);

    hosted::set_current_core(1);
    sched.tick();
    assert_eq!(sched.ticks(), 0);

    hosted::set_current_core(0);
    sched.tick();
    assert_eq!(sched.ticks(), 1);
}

// =============================================================================
// EXIT / RECLAMAÇÃO
// =============================================================================

#[test]
fn exit_reclaims_unit_exactly_once() {
    let (sched, units) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    sched.launch();
    let freed = units.stats().freed;

    sched.retire_current();

    assert_eq!(sched.current(), Some(b));
    assert_eq!(units.stats().freed, freed + 1);
    assert_eq!(sched.thread_info(a), None);
    assert!(!tids(sched, ListKind::All).contains(&a.tid().as_u64()));

    sched.yield_now();
    sched.yield_now();
    assert_eq!(units.stats().freed, freed + 1);
}

#[test]
fn thread_body_runs_entry_then_retires() {
    let (sched, units) = boot(1);
    let counter: &'static AtomicUsize = Box::leak(Box::new(AtomicUsize::new(0)));
    let a = sched
        .create("body", PRIORITY_DEFAULT, bump, counter as *const AtomicUsize as usize)
        .expect("create");
    sched.launch();
    assert_eq!(sched.current(), Some(a));

    run_thread_body(sched, bump, counter as *const AtomicUsize as usize);

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(sched.thread_info(a), None);
    assert_eq!(units.stats().freed, 1);
    let current = sched.current().expect("current");
    assert!(sched.thread_info(current).expect("idle").idle);
}

#[test]
#[should_panic]
fn exit_of_idle_is_fatal() {
    let (sched, _) = boot(1);
    sched.launch();
    sched.exit();
}

// =============================================================================
// CONTRATOS FATAIS
// =============================================================================

#[test]
#[should_panic]
fn yield_with_interrupts_enabled_is_fatal() {
    let (sched, _) = boot(1);
    spawn(sched, "a");
    sched.launch();
    unsafe { Cpu::enable_interrupts() };
    sched.yield_now();
}

#[test]
#[should_panic]
fn yield_holding_spinlock_is_fatal() {
    let (sched, _) = boot(1);
    spawn(sched, "a");
    sched.launch();
    let lock = Spinlock::new("teste", ());
    let _guard = lock.lock();
    sched.yield_now();
}

#[test]
#[should_panic]
fn yield_before_start_is_fatal() {
    let (sched, _) = boot(1);
    spawn(sched, "a");
    sched.yield_now();
}

#[test]
#[should_panic]
fn init_twice_is_fatal() {
    let (sched, units) = boot(1);
    sched.init(SchedConfig::new(1), units);
}

#[test]
#[should_panic]
fn launch_twice_on_same_core_is_fatal() {
    let (sched, _) = boot(1);
    sched.launch();
    sched.launch();
}

#[test]
#[should_panic]
fn clobbered_canary_is_fatal_on_switch() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    spawn(sched, "b");
    sched.launch();

    let thread = sched.table.resolve(a).expect("a");
    unit::clobber_canary(thread);
    sched.yield_now();
}

// =============================================================================
// MULTI-CORE
// =============================================================================

#[test]
fn each_core_runs_a_distinct_thread() {
    let (sched, _) = boot(2);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");

    sched.launch();
    hosted::set_current_core(1);
    sched.launch();

    // a (TID 3) mora no núcleo 1, b (TID 4) no núcleo 0
    assert_eq!(sched.current(), Some(a));
    hosted::set_current_core(0);
    assert_eq!(sched.current(), Some(b));

    let running = list(sched, ListKind::All)
        .iter()
        .filter(|info| info.status == ThreadStatus::Running)
        .count();
    assert_eq!(running, 2);
}

#[test]
fn shared_policy_lets_any_core_pull_work() {
    let (sched, _) = boot_with(2, 16, ReadyPolicy::Shared);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    assert_eq!(tids(sched, ListKind::Ready(CoreId(0))), [a.tid().as_u64(), b.tid().as_u64()]);

    hosted::set_current_core(1);
    sched.launch();

    assert_eq!(sched.current(), Some(a));
    assert_eq!(tids(sched, ListKind::Ready(CoreId(0))), [b.tid().as_u64()]);
}

#[test]
fn two_cores_never_run_the_same_thread() {
    const CORES: u32 = 2;
    const ROUNDS: usize = 2000;

    let (sched, _) = boot_with(CORES as usize, 16, ReadyPolicy::Shared);
    for name in ["a", "b", "c", "d"] {
        spawn(sched, name);
    }

    std::thread::scope(|scope| {
        for core in 0..CORES {
            scope.spawn(move || {
                hosted::reset_cpu(core, false);
                sched.launch();

                let other = sched.cpus.get_for(CoreId(core ^ 1));
                for _ in 0..ROUNDS {
                    sched.yield_now();
                    let mine = sched.cpus.get().current().expect("corrente");
                    assert!(sched.thread(mine).on_cpu());
                    assert_ne!(other.current(), Some(mine));
                }
            });
        }
    });

    let running = list(sched, ListKind::All)
        .iter()
        .filter(|info| info.status == ThreadStatus::Running)
        .count();
    assert_eq!(running, CORES as usize);
}

// =============================================================================
// DEBUG
// =============================================================================

#[test]
fn dump_and_enumerate_leave_state_untouched() {
    let (sched, _) = boot(1);
    let a = spawn(sched, "a");
    let b = spawn(sched, "b");
    spawn(sched, "c");
    sched.launch();
    sched.sleep(4);

    let all = list(sched, ListKind::All);
    let ready = list(sched, ListKind::Ready(CoreId::BSP));

    sched.dump(DumpLists::all());

    assert_eq!(list(sched, ListKind::All), all);
    assert_eq!(list(sched, ListKind::Ready(CoreId::BSP)), ready);
    assert_eq!(sched.current(), Some(b));
    assert_eq!(tids(sched, ListKind::Sleep), [a.tid().as_u64()]);
}
