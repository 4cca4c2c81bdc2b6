use std::{
    collections::{HashMap, HashSet},
    fs, io,
    path::Path,
};

/// Banco de palabras válidas (en minúscula).
pub type Bank = HashSet<String>;

/// Conteo palabra -> ocurrencias de un documento o acumulado.
pub type WordCounts = HashMap<String, u64>;

/// Largo mínimo de una palabra para que cuente.
pub const MIN_WORD_LEN: usize = 3;

/// Arma el banco a partir de un texto con una palabra por línea.
/// Se normaliza a minúscula y se ignoran las líneas vacías.
pub fn parse_word_bank(content: &str) -> Bank {
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Lee el banco de palabras desde un archivo de texto.
pub fn load_word_bank(path: impl AsRef<Path>) -> io::Result<Bank> {
    let content = fs::read_to_string(path)?;
    Ok(parse_word_bank(&content))
}

/// Una palabra es válida si tiene al menos `MIN_WORD_LEN` letras,
/// sólo letras, y está en el banco.
pub fn is_valid_word(token: &str, bank: &Bank) -> bool {
    token.len() >= MIN_WORD_LEN
        && token.chars().all(|c| c.is_alphabetic())
        && bank.contains(token)
}

/// Cuenta las palabras válidas de `text`.
///
/// El texto se pasa a minúscula y se corta en todo carácter que no sea una
/// letra ASCII, así "hello123" aporta "hello" y "don't" aporta "don" y "t".
/// La minúscula es carácter a carácter: "İ" queda en "i" sin el punto
/// combinante que agrega `str::to_lowercase`.
pub fn count_valid_words(text: &str, bank: &Bank) -> WordCounts {
    let mut counts: WordCounts = HashMap::new();

    if bank.is_empty() {
        return counts;
    }

    let lowered: String = text.chars().map(lower_char).collect();
    for token in lowered.split(|c: char| !c.is_ascii_alphabetic()) {
        if is_valid_word(token, bank) {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }

    counts
}

fn lower_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, io::Write, path::PathBuf};

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("words_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    fn bank(words: &[&str]) -> Bank {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn counts(pairs: &[(&str, u64)]) -> WordCounts {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    fn test_bank() -> Bank {
        bank(&[
            "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "hello", "world",
            "testing", "golang", "code",
        ])
    }

    #[test]
    fn count_valid_words_oracion_simple() {
        let got = count_valid_words("The quick brown fox jumps over the lazy dog", &test_bank());

        assert_eq!(
            got,
            counts(&[
                ("the", 2),
                ("quick", 1),
                ("brown", 1),
                ("fox", 1),
                ("jumps", 1),
                ("over", 1),
                ("lazy", 1),
                ("dog", 1),
            ])
        );
    }

    #[test]
    fn count_valid_words_ignora_mayusculas() {
        let got = count_valid_words("HELLO Hello hello WORLD World world", &test_bank());
        assert_eq!(got, counts(&[("hello", 3), ("world", 3)]));
    }

    #[test]
    fn count_valid_words_corta_en_puntuacion_y_digitos() {
        let got = count_valid_words("Hello, world! Testing... testing; golang.", &test_bank());
        assert_eq!(
            got,
            counts(&[("hello", 1), ("world", 1), ("testing", 2), ("golang", 1)])
        );

        let got = count_valid_words("hello123 world456 code789", &test_bank());
        assert_eq!(got, counts(&[("hello", 1), ("world", 1), ("code", 1)]));
    }

    #[test]
    fn count_valid_words_descarta_palabras_cortas_y_fuera_del_banco() {
        let got = count_valid_words("the a an is to be", &test_bank());
        assert_eq!(got, counts(&[("the", 1)]));

        let got = count_valid_words("The quick xyz jumps abc over", &test_bank());
        assert_eq!(
            got,
            counts(&[("the", 1), ("quick", 1), ("jumps", 1), ("over", 1)])
        );
    }

    #[test]
    fn count_valid_words_palabras_cortas_no_cuentan_aunque_esten_en_el_banco() {
        let got = count_valid_words("go go an", &bank(&["go", "an"]));
        assert!(got.is_empty());
    }

    #[test]
    fn count_valid_words_casos_vacios() {
        assert!(count_valid_words("", &test_bank()).is_empty());
        assert!(count_valid_words("!@#$%^&*()", &test_bank()).is_empty());
        assert!(count_valid_words("hello world testing", &Bank::new()).is_empty());
    }

    #[test]
    fn count_valid_words_letras_no_ascii_separan_tokens() {
        // "café" se corta en "caf", que no está en el banco
        let got = count_valid_words("café codeñcode", &bank(&["cafe", "code"]));
        assert_eq!(got, counts(&[("code", 2)]));
    }

    #[test]
    fn count_valid_words_i_con_punto_no_parte_la_palabra() {
        let got = count_valid_words("İnternet INTERNET", &bank(&["internet"]));
        assert_eq!(got, counts(&[("internet", 2)]));
    }

    #[test]
    fn count_valid_words_espacios_variados() {
        let got = count_valid_words("  hello   world  \t testing  \n golang  ", &test_bank());
        assert_eq!(
            got,
            counts(&[("hello", 1), ("world", 1), ("testing", 1), ("golang", 1)])
        );
    }

    #[test]
    fn is_valid_word_exige_largo_letras_y_banco() {
        let b = test_bank();
        assert!(is_valid_word("fox", &b));
        assert!(!is_valid_word("fo", &b));
        assert!(!is_valid_word("f0x", &b));
        assert!(!is_valid_word("cat", &b));
    }

    #[test]
    fn parse_word_bank_normaliza_lineas() {
        let b = parse_word_bank("Hello\n  world  \n\nTESTING\r\n");
        assert_eq!(b, bank(&["hello", "world", "testing"]));
    }

    #[test]
    fn load_word_bank_lee_archivo() {
        let tmp = temp_dir("load");
        let path = tmp.join("word_bank.txt");

        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "alpha").unwrap();
        writeln!(f, "Beta").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "alpha").unwrap();

        let b = load_word_bank(&path).unwrap();
        assert_eq!(b, bank(&["alpha", "beta"]));
    }

    #[test]
    fn load_word_bank_devuelve_error_si_no_existe() {
        let tmp = temp_dir("missing");
        let res = load_word_bank(tmp.join("no_existe.txt"));
        assert!(res.is_err());
    }
}
