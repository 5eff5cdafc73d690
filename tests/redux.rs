/*!
End to end tests of the DNA benchmark workload: strip a FASTA file down
to its sequence, count nine pattern variants from parallel threads, then
run a chain of replacements.
*/

use seqre::{get_or_compile, Input, Regex, RegexCache};

const VARIANTS: [(&str, usize); 9] = [
    ("agggtaaa|tttaccct", 5),
    ("[cgt]gggtaaa|tttaccc[acg]", 2),
    ("a[act]ggtaaa|tttacc[agt]t", 1),
    ("ag[act]gtaaa|tttac[agt]ct", 1),
    ("agg[act]taaa|ttta[agt]cct", 1),
    ("aggg[acg]aaa|ttt[cgt]ccct", 1),
    ("agggt[cgt]aa|tt[acg]accct", 1),
    ("agggta[cgt]a|t[acg]taccct", 1),
    ("agggtaa[cgt]|[acg]ttaccct", 1),
];

/// One planted fragment per line, padded with `c` filler that cannot
/// take part in any variant match. Each fragment matches exactly one
/// variant, so the expected counts above follow by construction.
const PLANTS: [&str; 14] = [
    "agggtaaa", "tttaccct", "agggtaaa", "cgggtaaa", "tttaccca", "acggtaaa",
    "agcgtaaa", "aggctaaa", "agggcaaa", "agggtgaa", "agggtaga", "agggtaag",
    "agggtaaa", "tttaccct",
];

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fasta() -> String {
    let mut out = String::from(">ONE synthetic test sequence\n");
    for (i, plant) in PLANTS.iter().enumerate() {
        if i == PLANTS.len() / 2 {
            out.push_str(">TWO more synthetic test data\n");
        }
        out.push_str("cccccccc");
        out.push_str(plant);
        out.push('\n');
    }
    out.push_str("cccccccc\n");
    out
}

fn sanitized() -> String {
    get_or_compile(">.*\n|\n").unwrap().replace_all(&fasta(), "")
}

#[test]
fn sanitize_strips_headers_and_newlines() {
    let cleaned = sanitized();
    assert_eq!(cleaned.len(), PLANTS.len() * 16 + 8);
    assert!(!cleaned.contains('\n'));
    assert!(!cleaned.contains('>'));
    assert!(cleaned.starts_with("ccccccccagggtaaa"));
}

#[test]
fn variant_counts() {
    init_logs();
    let seq = sanitized();
    for (pattern, expected) in VARIANTS {
        let re = get_or_compile(pattern).unwrap();
        assert_eq!(re.count(&seq), expected, "{pattern}");
    }
}

#[test]
fn variant_counts_from_parallel_threads() {
    let seq = sanitized();
    let cache = RegexCache::new();
    let counts: Vec<(usize, usize)> = std::thread::scope(|scope| {
        VARIANTS
            .map(|(pattern, expected)| {
                let seq = seq.as_str();
                let cache = &cache;
                scope.spawn(move || {
                    let re = cache.get_or_compile(pattern).unwrap();
                    (re.count(seq), expected)
                })
            })
            .map(|handle| handle.join().unwrap())
            .to_vec()
    });
    for (got, expected) in counts {
        assert_eq!(got, expected);
    }
    assert_eq!(cache.len(), VARIANTS.len());
}

#[test]
fn count_equals_repeated_find_next() {
    let seq = sanitized();
    for (pattern, _) in VARIANTS {
        let re = get_or_compile(pattern).unwrap();
        let mut by_hand = 0;
        let mut at = 0;
        while let Some(m) = re.find(Input::new(&seq).span(at..seq.len())) {
            by_hand += 1;
            at = m.end().max(at + 1);
        }
        assert_eq!(re.count(&seq), by_hand, "{pattern}");
    }
}

#[test]
fn replacement_chain() {
    let steps: [(&str, &str); 5] = [
        ("tHa[Nt]", "<4>"),
        ("aND|caN|Ha[DS]|WaS", "<3>"),
        ("a[NSt]|BY", "<2>"),
        ("<[^>]*>", "|"),
        (r"\|[^|][^|]*\|", "-"),
    ];
    let mut text = String::from("tHat aND tHaN BY WaS");
    for (pattern, replacement) in steps {
        text = get_or_compile(pattern)
            .unwrap()
            .replace_all(&text, replacement);
    }
    assert_eq!(text, "- - |");
}

#[test]
fn replacement_output_length_arithmetic() {
    let seq = sanitized();
    let re = Regex::new("aggg[acg]aaa|ttt[cgt]ccct").unwrap();
    let matches: Vec<_> = re.find_iter(&seq).collect();
    let replaced = re.replace_all(&seq, "*");
    let matched: usize = matches.iter().map(|m| m.len()).sum();
    assert_eq!(
        replaced.len(),
        seq.len() - matched + matches.len(),
    );
}

#[test]
fn replacement_with_excluded_alphabet_is_idempotent() {
    let seq = sanitized();
    let re = Regex::new("agggtaaa|tttaccct").unwrap();
    let once = re.replace_all(&seq, "#");
    let twice = re.replace_all(&once, "#");
    assert_eq!(once, twice);
}
