use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod error;
pub mod urls;
pub mod words;

pub use aggregate::{merge, top_n, Aggregator};
pub use error::{ErrorKind, ErrorReport, PipelineError};
pub use words::{count_valid_words, Bank, WordCounts};

/// Cantidad de palabras que se devuelven en el ranking si nadie dice otra cosa.
pub const DEFAULT_TOP_N: usize = 10;

/* --------- Resultado del ranking --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Ranking final. El JSON usa `top_words` como campo raíz; los consumidores
/// dependen de ese nombre y del orden del arreglo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "top_words")]
    pub top: Vec<WordCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn output_serializa_con_nombres_de_campo_estables() {
        let out = Output {
            top: vec![
                WordCount { word: "world".to_string(), count: 4 },
                WordCount { word: "hello".to_string(), count: 2 },
            ],
        };

        let v = serde_json::to_value(&out).unwrap();

        assert_eq!(
            v,
            json!({
                "top_words": [
                    {"word": "world", "count": 4},
                    {"word": "hello", "count": 2},
                ]
            })
        );
    }

    #[test]
    fn output_vacio_serializa_arreglo_vacio() {
        let v = serde_json::to_value(Output::default()).unwrap();
        assert_eq!(v, json!({ "top_words": [] }));
    }
}
