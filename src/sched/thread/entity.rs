//! Thread Control Block
//!
//! O TCB mora no início da própria unidade (ver `unit.rs`) e é publicado na
//! tabela de slots. Os campos mutáveis depois da publicação são atômicos ou
//! ficam em `UnsafeCell` guardados pelo lock da lista correspondente.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicU8, AtomicUsize, Ordering};

use super::state::ThreadStatus;
use crate::arch::CpuContext;
use crate::klib::list::{Link, NodeId};
use crate::sched::config::{MAX_NAME_LEN, THREAD_MAGIC, THREAD_POISON};
use crate::sys::{CoreId, Tid};

/// Corpo de uma thread: `entry(arg)`.
pub type ThreadEntry = fn(usize);

/// Nome copiado (até `MAX_NAME_LEN` bytes, cortado em fronteira UTF-8).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ThreadName {
    bytes: [u8; MAX_NAME_LEN],
    len: u8,
}

impl ThreadName {
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(MAX_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0u8; MAX_NAME_LEN];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            bytes,
            len: end as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("?")
    }
}

impl core::fmt::Debug for ThreadName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Thread Control Block
pub struct Thread {
    magic: AtomicU64,
    /// ID único
    tid: Tid,
    /// Slot na tabela (também o índice usado pelos links)
    slot: NodeId,
    /// Nome (debug)
    name: ThreadName,
    /// Prioridade (armazenada, sem efeito na ordem)
    priority: i32,
    /// Thread idle de algum núcleo (nunca entra em fila de prontos)
    idle: bool,
    status: AtomicU8,
    /// Contexto de CPU salvo. Só o núcleo que troca a thread escreve aqui.
    context: UnsafeCell<CpuContext>,
    entry: ThreadEntry,
    arg: usize,

    /// Fila de prontos para onde a thread volta
    home_cpu: AtomicUsize,
    /// Algum núcleo ainda executa na stack desta thread
    on_cpu: AtomicBool,
    /// Vezes que foi escolhida para rodar
    runs: AtomicU64,

    // --- Sleep (escritos sob o lock do sleep) ---
    sleep_ticks: AtomicI64,
    armed_at: AtomicU64,

    // --- Links intrusivos ---
    pub(crate) all_link: UnsafeCell<Link>,
    pub(crate) ready_link: UnsafeCell<Link>,
    pub(crate) sleep_link: UnsafeCell<Link>,
}

// SAFETY: os UnsafeCell são guardados pelos locks das listas (links) ou
// tocados apenas pelo núcleo que faz a troca de contexto (context).
unsafe impl Sync for Thread {}

/// Parâmetros de construção de um TCB.
pub struct ThreadParams<'a> {
    pub tid: Tid,
    pub slot: NodeId,
    pub name: &'a str,
    pub priority: i32,
    pub entry: ThreadEntry,
    pub arg: usize,
    pub home_cpu: CoreId,
    pub idle: bool,
}

impl Thread {
    pub fn new(params: ThreadParams<'_>) -> Self {
        Self {
            magic: AtomicU64::new(THREAD_MAGIC),
            tid: params.tid,
            slot: params.slot,
            name: ThreadName::new(params.name),
            priority: params.priority,
            idle: params.idle,
            status: AtomicU8::new(ThreadStatus::Ready.as_u8()),
            context: UnsafeCell::new(CpuContext::new()),
            entry: params.entry,
            arg: params.arg,
            home_cpu: AtomicUsize::new(params.home_cpu.index()),
            on_cpu: AtomicBool::new(false),
            runs: AtomicU64::new(0),
            sleep_ticks: AtomicI64::new(0),
            armed_at: AtomicU64::new(0),
            all_link: UnsafeCell::new(Link::new()),
            ready_link: UnsafeCell::new(Link::new()),
            sleep_link: UnsafeCell::new(Link::new()),
        }
    }

    pub fn tid(&self) -> Tid {
        self.tid
    }

    pub fn slot(&self) -> NodeId {
        self.slot
    }

    pub fn name(&self) -> ThreadName {
        self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn entry(&self) -> ThreadEntry {
        self.entry
    }

    pub fn arg(&self) -> usize {
        self.arg
    }

    /// TCB íntegro (não envenenado nem sobrescrito)?
    pub fn is_valid(&self) -> bool {
        self.magic.load(Ordering::Acquire) == THREAD_MAGIC
    }

    pub(crate) fn poison(&self) {
        self.magic.store(THREAD_POISON, Ordering::Release);
    }

    // --- Estado ---

    pub fn status(&self) -> ThreadStatus {
        ThreadStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: ThreadStatus) {
        self.status.store(status.as_u8(), Ordering::Release);
    }

    /// Transição atômica `from → to`. Retorna `false` se o estado não era `from`.
    pub(crate) fn transition(&self, from: ThreadStatus, to: ThreadStatus) -> bool {
        self.status
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    // --- Núcleos ---

    pub fn home_cpu(&self) -> CoreId {
        CoreId(self.home_cpu.load(Ordering::Relaxed) as u32)
    }

    pub(crate) fn set_home_cpu(&self, core: CoreId) {
        self.home_cpu.store(core.index(), Ordering::Relaxed);
    }

    pub fn on_cpu(&self) -> bool {
        self.on_cpu.load(Ordering::Acquire)
    }

    pub(crate) fn set_on_cpu(&self, on: bool) {
        self.on_cpu.store(on, Ordering::Release);
    }

    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    pub(crate) fn note_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    // --- Sleep ---

    pub fn sleep_ticks(&self) -> i64 {
        self.sleep_ticks.load(Ordering::Relaxed)
    }

    pub fn armed_at(&self) -> u64 {
        self.armed_at.load(Ordering::Relaxed)
    }

    /// Arma o contador. Chamador segura o lock do sleep.
    pub(crate) fn arm_sleep(&self, ticks: i64, now: u64) {
        self.sleep_ticks.store(ticks, Ordering::Relaxed);
        self.armed_at.store(now, Ordering::Relaxed);
    }

    /// Decrementa o contador e retorna o valor restante. Chamador segura o
    /// lock do sleep.
    pub(crate) fn count_down(&self) -> i64 {
        self.sleep_ticks.fetch_sub(1, Ordering::Relaxed) - 1
    }

    // --- Contexto ---

    /// Ponteiro para o contexto salvo (usado apenas na troca de contexto).
    pub(crate) fn context_ptr(&self) -> *mut CpuContext {
        self.context.get()
    }
}
