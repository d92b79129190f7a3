//! Arquivo: klib/list/intrusive.rs
//!
//! Propósito: Lista Duplamente Encadeada INTRUSIVA, indexada por slot.
//!
//! Detalhes de Implementação:
//! - Os nós não pertencem à lista: cada elemento carrega o próprio `Link`
//!   (prev/next) e a lista guarda apenas head/tail/len.
//! - Os links referenciam nós pelo índice (`NodeId`), não por ponteiro. O
//!   dono dos elementos (ex: a tabela de threads) resolve índice → `Link`
//!   através de um `LinkAdapter`.
//! - Nenhuma alocação. push_back, pop_front e remove são O(1).
//! - A lista NÃO tem lock próprio: quem a guarda dentro de um `Spinlock`
//!   garante que ninguém mais toca nos links ao mesmo tempo.

/// Índice de um nó (slot na tabela dona dos elementos).
pub type NodeId = u16;

/// Elo intrusivo embutido em cada elemento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    prev: Option<NodeId>,
    next: Option<NodeId>,
    linked: bool,
}

impl Link {
    pub const fn new() -> Self {
        Self {
            prev: None,
            next: None,
            linked: false,
        }
    }

    /// O elemento está em alguma lista que usa este elo?
    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

/// Acesso aos elos de um conjunto de nós.
///
/// Implementações usam mutabilidade interior; a exclusão mútua é dada pelo
/// lock que guarda a lista.
pub trait LinkAdapter {
    fn link(&self, node: NodeId) -> Link;
    fn set_link(&self, node: NodeId, link: Link);
}

/// Cabeça da lista.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrusiveList {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl IntrusiveList {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<NodeId> {
        self.head
    }

    /// Sucessor de `node` (que deve estar nesta lista).
    pub fn next<A: LinkAdapter>(&self, links: &A, node: NodeId) -> Option<NodeId> {
        links.link(node).next
    }

    /// Insere no fim. Inserir um nó já encadeado é fatal.
    pub fn push_back<A: LinkAdapter>(&mut self, links: &A, node: NodeId) {
        if links.link(node).linked {
            crate::kfatal!("(List) push_back de nó já encadeado: ", node);
        }

        links.set_link(
            node,
            Link {
                prev: self.tail,
                next: None,
                linked: true,
            },
        );

        match self.tail {
            None => self.head = Some(node),
            Some(tail) => {
                let mut tail_link = links.link(tail);
                tail_link.next = Some(node);
                links.set_link(tail, tail_link);
            }
        }

        self.tail = Some(node);
        self.len += 1;
    }

    /// Remove e retorna o primeiro nó.
    pub fn pop_front<A: LinkAdapter>(&mut self, links: &A) -> Option<NodeId> {
        let node = self.head?;
        self.unlink(links, node);
        Some(node)
    }

    /// Remove `node` desta lista. Retorna `false` se ele não estava encadeado.
    ///
    /// O nó precisa pertencer a ESTA lista (e não a outra lista que usa o
    /// mesmo elo).
    pub fn remove<A: LinkAdapter>(&mut self, links: &A, node: NodeId) -> bool {
        if !links.link(node).linked {
            return false;
        }
        self.unlink(links, node);
        true
    }

    /// Percorre do início ao fim.
    pub fn iter<'a, A: LinkAdapter>(&self, links: &'a A) -> Iter<'a, A> {
        Iter {
            links,
            cursor: self.head,
        }
    }

    fn unlink<A: LinkAdapter>(&mut self, links: &A, node: NodeId) {
        let link = links.link(node);

        match link.prev {
            None => self.head = link.next,
            Some(prev) => {
                let mut prev_link = links.link(prev);
                prev_link.next = link.next;
                links.set_link(prev, prev_link);
            }
        }

        match link.next {
            None => self.tail = link.prev,
            Some(next) => {
                let mut next_link = links.link(next);
                next_link.prev = link.prev;
                links.set_link(next, next_link);
            }
        }

        links.set_link(node, Link::new());
        self.len -= 1;
    }
}

impl Default for IntrusiveList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterador sobre os índices de uma lista.
pub struct Iter<'a, A: LinkAdapter> {
    links: &'a A,
    cursor: Option<NodeId>,
}

impl<A: LinkAdapter> Iterator for Iter<'_, A> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.cursor?;
        self.cursor = self.links.link(node).next;
        Some(node)
    }
}

/// Elos em um array simples (usado pelos self-tests e testes de host).
pub struct ArrayLinks<const N: usize> {
    links: [core::cell::Cell<Link>; N],
}

impl<const N: usize> ArrayLinks<N> {
    pub const fn new() -> Self {
        Self {
            links: [const { core::cell::Cell::new(Link::new()) }; N],
        }
    }
}

impl<const N: usize> Default for ArrayLinks<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LinkAdapter for ArrayLinks<N> {
    fn link(&self, node: NodeId) -> Link {
        self.links[node as usize].get()
    }

    fn set_link(&self, node: NodeId, link: Link) {
        self.links[node as usize].set(link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<const N: usize>(list: &IntrusiveList, links: &ArrayLinks<N>) -> std::vec::Vec<NodeId> {
        list.iter(links).collect()
    }

    #[test]
    fn push_back_and_pop_front_are_fifo() {
        let links = ArrayLinks::<4>::new();
        let mut list = IntrusiveList::new();

        list.push_back(&links, 2);
        list.push_back(&links, 0);
        list.push_back(&links, 3);
        assert_eq!(list.len(), 3);
        assert_eq!(collect(&list, &links), [2, 0, 3]);

        assert_eq!(list.pop_front(&links), Some(2));
        assert_eq!(list.pop_front(&links), Some(0));
        assert_eq!(list.pop_front(&links), Some(3));
        assert_eq!(list.pop_front(&links), None);
        assert!(list.is_empty());
    }

    #[test]
    fn remove_from_middle_head_and_tail() {
        let links = ArrayLinks::<5>::new();
        let mut list = IntrusiveList::new();
        for node in 0..5 {
            list.push_back(&links, node);
        }

        assert!(list.remove(&links, 2));
        assert!(list.remove(&links, 0));
        assert!(list.remove(&links, 4));
        assert_eq!(collect(&list, &links), [1, 3]);
        assert_eq!(list.front(), Some(1));
        assert_eq!(list.next(&links, 1), Some(3));
        assert_eq!(list.next(&links, 3), None);

        // Removido fica livre para outra inserção
        assert!(!links.link(2).is_linked());
        assert!(!list.remove(&links, 2));
        list.push_back(&links, 2);
        assert_eq!(collect(&list, &links), [1, 3, 2]);
    }

    #[test]
    #[should_panic]
    fn double_insert_is_fatal() {
        let links = ArrayLinks::<2>::new();
        let mut list = IntrusiveList::new();
        list.push_back(&links, 1);
        list.push_back(&links, 1);
    }
}
