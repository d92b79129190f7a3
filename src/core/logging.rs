// =============================================================================
// KERNEL LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do escalonador com custo ZERO quando desligado.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - Apenas strings literais + valores em hex
// - SEM alocação
// - Escreve APENAS na serial (`drivers::serial`)
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Erros fatais ou críticos
// - WARN:  Situações suspeitas mas recuperáveis
// - INFO:  Fluxo normal (criação de threads, boot dos núcleos)
// - DEBUG: Bloqueios, wakeups, reclamação de unidades
// - TRACE: Cada troca de contexto, cada tick
//
// FEATURES:
// - no_logs:   Remove 100% dos logs
// - log_error: ERROR, WARN, [OK]/[FAIL]
// - log_info:  + INFO
// - log_debug: + DEBUG
// - log_trace: Todos os níveis (padrão)
//
// COMO USAR:
//   kinfo!("(Sched) Inicializando...");         // Apenas string
//   kinfo!("(Sched) TID=", tid.as_u64());        // String + hex
//   klog!("Slot=", slot, " TID=", tid);          // Múltiplos valores
//   kfatal!("(Sched) yield com IRQs ligadas");   // Log + panic
//
// =============================================================================

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";
pub const P_OK: &str = "\x1b[32m[OK]\x1b[0m ";
pub const P_FAIL: &str = "\x1b[1;31m[FAIL]\x1b[0m ";

// =============================================================================
// MACROS DE NÍVEL
// =============================================================================
/// kerror! - Sempre ativo (exceto com no_logs).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    // Apenas string literal
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_ERROR);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_nl();
    }};
    // String + valor hex
    ($msg:expr, $val:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_ERROR);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_hex($val as u64);
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}
/// kwarn! - Situações suspeitas mas recuperáveis.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    // Apenas string literal
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_WARN);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_nl();
    }};
    // String + valor hex
    ($msg:expr, $val:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_WARN);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_hex($val as u64);
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}
/// kinfo! - Eventos importantes do fluxo normal.
#[cfg(all(not(feature = "no_logs"), any(feature = "log_info", feature = "log_debug", feature = "log_trace")))]
#[macro_export]
macro_rules! kinfo {
    // Apenas string literal
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_INFO);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_nl();
    }};
    // String + valor hex
    ($msg:expr, $val:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_INFO);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_hex($val as u64);
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(not(all(not(feature = "no_logs"), any(feature = "log_info", feature = "log_debug", feature = "log_trace"))))]
#[macro_export]
macro_rules! kinfo {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}
/// kdebug! - Informações de debugging.
#[cfg(all(not(feature = "no_logs"), any(feature = "log_debug", feature = "log_trace")))]
#[macro_export]
macro_rules! kdebug {
    // Apenas string literal
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_DEBUG);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_nl();
    }};
    // String + valor hex
    ($msg:expr, $val:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_DEBUG);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_hex($val as u64);
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(not(all(not(feature = "no_logs"), any(feature = "log_debug", feature = "log_trace"))))]
#[macro_export]
macro_rules! kdebug {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}
/// ktrace! - Detalhes de cada operação.
#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    // Apenas string literal
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_TRACE);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_nl();
    }};
    // String + valor hex
    ($msg:expr, $val:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_TRACE);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_hex($val as u64);
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}

// =============================================================================
// MACROS AUXILIARES
// =============================================================================

/// klog! - Log genérico sem prefixo de nível.
///
/// Útil para construir linhas com múltiplos valores (ex: `dump`).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! klog {
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_hex($val as u64);
    }};
    ($msg1:expr, $val:expr, $msg2:expr) => {{
        $crate::drivers::serial::emit_str($msg1);
        $crate::drivers::serial::emit_hex($val as u64);
        $crate::drivers::serial::emit_str($msg2);
    }};
    ($msg1:expr, $val1:expr, $msg2:expr, $val2:expr) => {{
        $crate::drivers::serial::emit_str($msg1);
        $crate::drivers::serial::emit_hex($val1 as u64);
        $crate::drivers::serial::emit_str($msg2);
        $crate::drivers::serial::emit_hex($val2 as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! klog {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}

/// knl! - Emite apenas newline.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! knl {
    () => {{
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! knl {
    () => {{}};
}

// =============================================================================
// MACROS DE STATUS (OK/FAIL)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_OK);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}

/// kfail! - Log de falha (prefixo vermelho [FAIL]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kfail {
    ($msg:expr) => {{
        $crate::drivers::serial::emit_str($crate::core::logging::P_FAIL);
        $crate::drivers::serial::emit_str($msg);
        $crate::drivers::serial::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kfail {
    ($($e:expr),* $(,)?) => {{ $( let _ = &$e; )* }};
}

// =============================================================================
// CAMINHO FATAL
// =============================================================================

/// kfatal! - Violação de protocolo: loga em ERROR e entra em panic.
///
/// No bare-metal o panic handler desabilita interrupções e trava o núcleo.
/// No host o panic desenrola, o que deixa os contratos testáveis com
/// `#[should_panic]`.
///
/// A expressão tem tipo `!`.
#[macro_export]
macro_rules! kfatal {
    ($msg:expr) => {{
        $crate::kerror!($msg);
        panic!("{}", $msg)
    }};
    ($msg:expr, $val:expr) => {{
        $crate::kerror!($msg, $val);
        panic!("{}", $msg)
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn every_level_accepts_message_and_value() {
        let slot: u16 = 3;
        let ticks: i64 = -1;

        crate::kerror!("(Log) erro");
        crate::kerror!("(Log) erro slot=", slot);
        crate::kwarn!("(Log) aviso");
        crate::kwarn!("(Log) aviso ticks=", ticks);
        crate::kinfo!("(Log) info");
        crate::kinfo!("(Log) info slot=", slot);
        crate::kdebug!("(Log) debug");
        crate::kdebug!("(Log) debug slot=", slot);
        crate::ktrace!("(Log) trace");
        crate::ktrace!("(Log) trace slot=", slot);
        crate::klog!("(Log) ", slot, " ticks=", ticks);
        crate::knl!();
        crate::kok!("(Log) ok");
        crate::kfail!("(Log) fail");
    }

    #[test]
    #[should_panic(expected = "(Log) fatal")]
    fn fatal_logs_and_panics_with_message() {
        crate::kfatal!("(Log) fatal", 1u8);
    }
}
