use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, PoisonError,
};

use crate::{words::WordCounts, WordCount};

/// Suma un conteo parcial dentro del acumulado global.
/// Es conmutativa y asociativa: el orden de llegada no cambia el resultado.
pub fn merge(global: &mut WordCounts, partial: WordCounts) {
    for (word, count) in partial {
        *global.entry(word).or_insert(0) += count;
    }
}

/// Top `n` del conteo: mayor cantidad primero, empates por palabra ascendente.
pub fn top_n(counts: &WordCounts, n: usize) -> Vec<WordCount> {
    let mut all: Vec<WordCount> = counts
        .iter()
        .map(|(word, count)| WordCount {
            word: word.clone(),
            count: *count,
        })
        .collect();

    // determinista: count desc, word asc
    all.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    all.truncate(n);
    all
}

/// Acumulador global compartido entre tareas.
///
/// Cada `merge` toma el lock sólo durante la suma de un conteo parcial;
/// nunca se mantiene mientras se espera red.
#[derive(Debug, Default)]
pub struct Aggregator {
    global: Mutex<WordCounts>,
    documents: AtomicUsize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, partial: WordCounts) {
        {
            let mut global = self.global.lock().unwrap_or_else(PoisonError::into_inner);
            merge(&mut global, partial);
        }
        self.documents.fetch_add(1, Ordering::Relaxed);
    }

    /// Cantidad de conteos parciales sumados hasta ahora.
    pub fn documents(&self) -> usize {
        self.documents.load(Ordering::Relaxed)
    }

    pub fn top_n(&self, n: usize) -> Vec<WordCount> {
        let global = self.global.lock().unwrap_or_else(PoisonError::into_inner);
        top_n(&global, n)
    }

    pub fn into_counts(self) -> WordCounts {
        self.global
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
