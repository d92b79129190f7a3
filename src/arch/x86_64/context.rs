//! Context switch
//!
//! Gerencia a troca de contexto entre threads de kernel.

/// Contexto de CPU (registradores salvos)
///
/// Apenas os callee-saved da SysV ABI: todo o resto já foi salvo pelo
/// chamador de `switch_context`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuContext {
    // Callee-saved registers (SysV ABI)
    pub rbx: u64,
    pub rbp: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,

    // Stack pointer
    pub rsp: u64,

    // Instruction pointer (return address)
    pub rip: u64,
}

impl CpuContext {
    /// Cria CpuContext zerado - usa const fn para evitar código SSE
    pub const fn new() -> Self {
        Self {
            rbx: 0,
            rbp: 0,
            r12: 0,
            r13: 0,
            r14: 0,
            r15: 0,
            rsp: 0,
            rip: 0,
        }
    }

    /// Configura uma thread nova para começar em `kthread_trampoline`.
    ///
    /// O trampolim recebe (scheduler, entry, arg) em R12/R13/R14.
    /// RSP aponta para o slot que `context_switch_asm` sobrescreve com o RIP;
    /// depois do `ret`, RSP fica em `stack_top - 8` (alinhamento de entrada de função).
    pub fn prepare(&mut self, stack_top: u64, scheduler: u64, entry: u64, arg: u64) {
        *self = Self::new();
        self.rsp = stack_top - 16;
        self.rip = kthread_trampoline as usize as u64;
        self.r12 = scheduler;
        self.r13 = entry;
        self.r14 = arg;
    }
}

impl Default for CpuContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Realiza context switch entre duas threads
///
/// Retorna quando `old` for retomado por alguma troca futura.
///
/// # Safety
///
/// - Interrupções devem estar desabilitadas
/// - old e new devem ser ponteiros válidos
pub unsafe fn switch_context(old: *mut CpuContext, new: *const CpuContext) {
    context_switch_asm(old as u64, new as u64);
}

// Assembly implementation of context_switch_asm
// RDI = old (mut ptr), RSI = new (ptr)
// Struct offsets (CpuContext):
// 0:rbx, 8:rbp, 16:r12, 24:r13, 32:r14, 40:r15, 48:rsp, 56:rip
core::arch::global_asm!(
    r#"
.global context_switch_asm
context_switch_asm:
    // Save Generic Registers (Callee-saved)
    mov [rdi + 0x00], rbx
    mov [rdi + 0x08], rbp
    mov [rdi + 0x10], r12
    mov [rdi + 0x18], r13
    mov [rdi + 0x20], r14
    mov [rdi + 0x28], r15

    // Save Stack Pointer
    mov [rdi + 0x30], rsp

    // Save Instruction Pointer (Return Address)
    mov rax, [rsp]
    mov [rdi + 0x38], rax

    // --- Switch Point ---

    // Load New Context
    mov rbx, [rsi + 0x00]
    mov rbp, [rsi + 0x08]
    mov r12, [rsi + 0x10]
    mov r13, [rsi + 0x18]
    mov r14, [rsi + 0x20]
    mov r15, [rsi + 0x28]

    // Switch Stack
    mov rsp, [rsi + 0x30]

    // 'mov [rsp], rax; ret' consome o slot de retorno (push rax vazaria 8 bytes)
    mov rax, [rsi + 0x38]
    mov [rsp], rax
    ret

.global kthread_trampoline
kthread_trampoline:
    // Primeira execução de uma thread: argumentos vieram nos callee-saved
    mov rdi, r12
    mov rsi, r13
    mov rdx, r14
    xor rbp, rbp
    and rsp, -16
    call {entry}
    ud2
"#,
    entry = sym crate::sched::core::entry::kthread_entry,
);

extern "C" {
    fn context_switch_asm(old: u64, new: u64);
    fn kthread_trampoline();
}
