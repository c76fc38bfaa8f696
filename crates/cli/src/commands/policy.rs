//! `wizard policy scan` — secret-detection check (§4.4 rule 3), run
//! locally against a piece of text.

pub fn scan(text: &str) {
    let findings = wizard_policy::detect::detect(text);
    if findings.is_empty() {
        println!("no secrets detected");
    } else {
        println!("detected: {}", findings.join(", "));
    }
    println!("redacted: {}", wizard_policy::detect::redact(text));
}
