// =============================================================================
// SERIAL DRIVER - ZERO OVERHEAD
// =============================================================================
//
// Saída de log do escalonador.
//
// ARQUITETURA:
// - Bare-metal: escrita direta na COM1 (UART 16550) via I/O ports.
// - Hosted (testes no host): stderr do processo.
//
// Em ambos os casos:
// - SEM Mutex/Spinlock (o logger é usado DENTRO de seções com spinlock)
// - SEM core::fmt no caminho comum
// - SEM alocação - Apenas strings literais e valores imediatos
//
// FUNÇÕES DISPONÍVEIS:
// - init()           : Configura a UART (no-op no host)
// - emit(byte)       : Envia um byte
// - emit_str(s)      : Envia string literal
// - emit_hex(v)      : Envia u64 em hexadecimal
// - emit_nl()        : Envia newline (\r\n)
//
// NOTA IMPORTANTE:
// Este driver NÃO garante exclusão mútua entre CPUs. Em ambiente SMP,
// os logs podem se intercalar. Isso é aceitável para debugging.
//
// =============================================================================

// Porta de dados da COM1
#[cfg(target_os = "none")]
const COM1_DATA: u16 = 0x3F8;

// Porta de status da COM1 (Line Status Register)
#[cfg(target_os = "none")]
const COM1_STATUS: u16 = 0x3FD;

// =============================================================================
// FUNÇÕES DE INICIALIZAÇÃO
// =============================================================================

/// Inicializa a porta serial COM1 (UART 16550).
///
/// Deve ser chamada uma vez durante o early-boot.
/// Configura: 38400 baud, 8N1, FIFO habilitado.
#[cfg(target_os = "none")]
pub fn init() {
    unsafe {
        // Disable interrupts
        port_out(COM1_DATA + 1, 0x00);

        // Enable DLAB (set baud rate divisor)
        port_out(COM1_DATA + 3, 0x80);

        // Divisor 3 = 38400 baud
        port_out(COM1_DATA, 0x03);
        port_out(COM1_DATA + 1, 0x00);

        // 8 bits, no parity, one stop bit
        port_out(COM1_DATA + 3, 0x03);

        // Enable FIFO, clear them, with 14-byte threshold
        port_out(COM1_DATA + 2, 0xC7);

        // RTS/DSR set
        port_out(COM1_DATA + 4, 0x0B);
    }
}

#[cfg(not(target_os = "none"))]
pub fn init() {}

// =============================================================================
// FUNÇÕES DE ESCRITA - CORE
// =============================================================================

/// Envia um único byte.
///
/// Esta é a função mais baixo nível. Todas as outras funções
/// de escrita usam esta internamente.
#[cfg(target_os = "none")]
#[inline(always)]
pub fn emit(byte: u8) {
    unsafe {
        // Espera o buffer de transmissão estar vazio (bit 5 do LSR)
        while port_in(COM1_STATUS) & 0x20 == 0 {
            core::hint::spin_loop();
        }
        port_out(COM1_DATA, byte);
    }
}

#[cfg(not(target_os = "none"))]
#[inline(always)]
pub fn emit(byte: u8) {
    // eprint! passa pela captura de saída do harness de testes
    std::eprint!("{}", byte as char);
}

/// Envia uma string.
#[inline(never)]
pub fn emit_str(s: &str) {
    #[cfg(not(target_os = "none"))]
    {
        std::eprint!("{}", s);
    }

    #[cfg(target_os = "none")]
    for byte in s.bytes() {
        emit(byte);
    }
}

/// Envia uma nova linha (CRLF).
#[inline(never)]
pub fn emit_nl() {
    #[cfg(target_os = "none")]
    emit(b'\r');
    emit(b'\n');
}

// =============================================================================
// FUNÇÕES DE ESCRITA - FORMATAÇÃO NUMÉRICA
// =============================================================================

/// Envia um valor u64 em formato hexadecimal.
///
/// Formato de saída: 0x0123456789ABCDEF (sempre 18 caracteres)
#[inline(never)]
pub fn emit_hex(value: u64) {
    let mut buf = [0u8; 18];
    buf[0] = b'0';
    buf[1] = b'x';
    for (i, slot) in buf[2..].iter_mut().enumerate() {
        let shift = 60 - (i * 4);
        *slot = nibble_to_ascii(((value >> shift) & 0xF) as u8);
    }
    // buf é ASCII puro
    if let Ok(s) = core::str::from_utf8(&buf) {
        emit_str(s);
    }
}

// =============================================================================
// ADAPTADOR core::fmt (só para o panic handler)
// =============================================================================

/// `core::fmt::Write` sobre a serial.
///
/// Fora do caminho comum dos logs: existe para o panic handler imprimir
/// mensagens formatadas.
pub struct SerialWriter;

impl core::fmt::Write for SerialWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        emit_str(s);
        Ok(())
    }
}

// =============================================================================
// FUNÇÕES AUXILIARES
// =============================================================================

/// Converte nibble (0-15) para caractere ASCII ('0'-'9', 'A'-'F').
#[inline(always)]
const fn nibble_to_ascii(n: u8) -> u8 {
    if n < 10 {
        b'0' + n
    } else {
        b'A' + (n - 10)
    }
}

/// Escreve byte diretamente na porta I/O.
#[cfg(target_os = "none")]
#[inline(always)]
unsafe fn port_out(port: u16, value: u8) {
    core::arch::asm!(
        "out dx, al",
        in("al") value,
        in("dx") port,
        options(nostack, nomem, preserves_flags)
    );
}

/// Lê byte diretamente da porta I/O.
#[cfg(target_os = "none")]
#[inline(always)]
unsafe fn port_in(port: u16) -> u8 {
    let value: u8;
    core::arch::asm!(
        "in al, dx",
        out("al") value,
        in("dx") port,
        options(nostack, nomem, preserves_flags)
    );
    value
}
