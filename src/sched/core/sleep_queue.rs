//! Sleep Queue - threads esperando um número de ticks
//!
//! Todo o estado (lista, relógio `now` e cursor da varredura) vive dentro de
//! um único `Spinlock<SleepQueue>` do escalonador.
//!
//! A varredura do tick segura o lock apenas por nó: `begin_sweep` avança o
//! relógio e posiciona o cursor; cada `sweep_step` processa um nó. Um
//! `cancel` concorrente (unblock) que remove o nó sob o cursor avança o
//! cursor antes, então a varredura nunca segue um link de um nó removido.
//!
//! BLOCKED → READY de uma thread que dormia só acontece com este lock
//! seguro (varredura ou `unblock`). Quando `sweep_step` devolve
//! `Expired`, a thread já é READY e fora de qualquer fila: ninguém mais a
//! acorda, executa ou reclama até o tick enfileirá-la.

use crate::klib::list::{IntrusiveList, NodeId};
use crate::sched::thread::{ThreadRef, ThreadStatus, ThreadTable};

use super::runqueue::{QueueLink, ThreadLinks};

/// Resultado de um passo da varredura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStep {
    /// Nenhum nó restante
    Done,
    /// Nó processado, continua dormindo
    Pending,
    /// Contador chegou a zero: nó removido e já READY, falta enfileirar
    Expired(ThreadRef),
}

pub struct SleepQueue {
    list: IntrusiveList,
    /// Próximo nó a visitar na varredura em andamento
    cursor: Option<NodeId>,
    /// Relógio de sleep (ticks desde o boot)
    now: u64,
}

impl SleepQueue {
    pub const fn new() -> Self {
        Self {
            list: IntrusiveList::new(),
            cursor: None,
            now: 0,
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Coloca `slot` para dormir `ticks` a partir de agora.
    pub fn arm(&mut self, table: &ThreadTable, slot: NodeId, ticks: i64) {
        let Some(thread) = table.get(slot) else {
            crate::kfatal!("(Sleep) arm de slot vazio: ", slot);
        };
        thread.arm_sleep(ticks, self.now);
        self.list
            .push_back(&ThreadLinks::new(table, QueueLink::Sleep), slot);
    }

    /// Tira `target` da fila (se estiver). Retorna `true` se removeu.
    ///
    /// Um handle obsoleto nunca remove a thread que hoje ocupa o slot.
    pub fn cancel(&mut self, table: &ThreadTable, target: ThreadRef) -> bool {
        if table.resolve(target).is_none() {
            return false;
        }
        let slot = target.slot();
        let links = ThreadLinks::new(table, QueueLink::Sleep);
        if self.cursor == Some(slot) {
            self.cursor = self.list.next(&links, slot);
        }
        self.list.remove(&links, slot)
    }

    /// Avança o relógio e inicia uma varredura. Retorna o novo `now`.
    pub fn begin_sweep(&mut self) -> u64 {
        self.now += 1;
        self.cursor = self.list.front();
        self.now
    }

    /// Processa o nó sob o cursor.
    ///
    /// Entradas armadas no tick corrente (`armed_at >= now`) não são
    /// decrementadas: `sleep(N)` armado em V só acorda em V+N ou depois.
    pub fn sweep_step(&mut self, table: &ThreadTable) -> SweepStep {
        let Some(slot) = self.cursor else {
            return SweepStep::Done;
        };

        let links = ThreadLinks::new(table, QueueLink::Sleep);
        self.cursor = self.list.next(&links, slot);

        let Some(thread) = table.get(slot) else {
            crate::kfatal!("(Sleep) slot vazio na fila: ", slot);
        };
        if thread.armed_at() >= self.now {
            return SweepStep::Pending;
        }

        if thread.count_down() > 0 {
            return SweepStep::Pending;
        }

        self.list.remove(&links, slot);
        if !thread.transition(ThreadStatus::Blocked, ThreadStatus::Ready) {
            crate::kfatal!("(Sleep) thread na fila fora de BLOCKED TID=", thread.tid().as_u64());
        }
        SweepStep::Expired(ThreadRef::new(slot, thread.tid()))
    }

    /// Visita os slots na ordem da fila.
    pub fn for_each(&self, table: &ThreadTable, mut f: impl FnMut(NodeId)) {
        let links = ThreadLinks::new(table, QueueLink::Sleep);
        for slot in self.list.iter(&links) {
            f(slot);
        }
    }
}

impl Default for SleepQueue {
    fn default() -> Self {
        Self::new()
    }
}
