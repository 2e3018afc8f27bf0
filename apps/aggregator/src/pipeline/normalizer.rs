//! Normalizer: maps a `RawPosting` onto the canonical schema.
//!
//! Pure functions over fixed keyword tables. Every table is ordered and the first
//! matching entry wins, so table order is the tie-break.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::posting::{Category, ContractType, NormalizedPosting, RawPosting, UNKNOWN_CITY};
use crate::pipeline::text::non_empty;

pub const MAX_SKILLS: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Keyword tables
// ────────────────────────────────────────────────────────────────────────────

const CONTRACT_RULES: &[(ContractType, &str)] = &[
    (ContractType::Cdi, r"\bcdi\b|indéterminée|indeterminee|\bpermanent\b"),
    (ContractType::Cdd, r"\bcdd\b|déterminée|determinee|\btemporary\b|fixed[- ]term"),
    (ContractType::Stage, r"\bstages?\b|stagiaire|\bintern(ship)?s?\b|\bpfe\b"),
    (ContractType::Freelance, r"free[- ]?lance|\bindependent\b|indépendant|independant"),
    (ContractType::Interim, r"intérim|interim"),
];

const CATEGORY_RULES: &[(Category, &str)] = &[
    (
        Category::Tech,
        r"développeur|developpeur|developer|programmeur|ingénieur logiciel|informatique|\btech\b|\bdata\b|\bit\b|\bweb\b|\bmobile\b|software|devops|full[- ]?stack",
    ),
    (Category::Design, r"design|graphi|créa|\bmotion\b|vidéo|video|\bux\b|\bui\b"),
    (Category::Commercial, r"commercia|vente|\bsales\b|business develop"),
    (
        Category::CustomerService,
        r"service client|téléconseill|teleconseill|call ?cent|centre d'appel|\bsupport\b|\bclients?\b",
    ),
    (
        Category::Finance,
        r"comptab|financ|gestion|\brh\b|ressources humaines|administrati",
    ),
    (Category::Logistics, r"logisti|transport|chauffeur|livr|supply|magasinier"),
    (
        Category::Engineering,
        r"ingénieur|ingenieur|engineer|\bbtp\b|civil|électri|electri|maintenance|mécani|mecani",
    ),
    (Category::Health, r"médecin|medecin|infirmi|santé|pharmac|médical|medical"),
    (Category::Education, r"enseignant|professeur|formateur|éducation|education|formation"),
    (Category::Hospitality, r"hôtel|hotel|restaura|tourisme|cuisin|serveu"),
];

const CITY_ALIASES: &[(&str, &[&str])] = &[
    ("Casablanca", &["casablanca", "casa", "الدار البيضاء"]),
    ("Rabat", &["rabat", "الرباط"]),
    ("Marrakech", &["marrakech", "marrakesh", "مراكش"]),
    ("Fès", &["fès", "fes", "fez", "فاس"]),
    ("Tanger", &["tanger", "tangier", "طنجة"]),
    ("Agadir", &["agadir", "أكادير", "اكادير"]),
    ("Meknès", &["meknès", "meknes", "مكناس"]),
    ("Oujda", &["oujda", "وجدة"]),
    ("Kénitra", &["kénitra", "kenitra", "القنيطرة"]),
    ("Tétouan", &["tétouan", "tetouan", "تطوان"]),
    ("Safi", &["safi", "آسفي"]),
    ("Mohammedia", &["mohammedia", "المحمدية"]),
    ("El Jadida", &["el jadida", "الجديدة"]),
    ("Béni Mellal", &["béni mellal", "beni mellal", "بني ملال"]),
    ("Nador", &["nador", "الناظور"]),
    ("Khouribga", &["khouribga", "خريبكة"]),
    ("Salé", &["salé"]),
    ("Settat", &["settat", "سطات"]),
    ("Larache", &["larache", "العرائش"]),
    ("Ksar El Kebir", &["ksar el kebir", "القصر الكبير"]),
    ("Taza", &["taza", "تازة"]),
    ("Laâyoune", &["laâyoune", "laayoune"]),
    ("Errachidia", &["errachidia", "الرشيدية"]),
    ("Ouarzazate", &["ouarzazate", "ورزازات"]),
];

const SKILL_VOCABULARY: &[(&str, &str)] = &[
    ("React", r"react"),
    ("Node.js", r"node\.?js"),
    ("JavaScript", r"javascript|\bjs\b"),
    ("TypeScript", r"typescript"),
    ("Python", r"python"),
    ("PHP", r"\bphp\b"),
    ("Java", r"\bjava\b"),
    ("Angular", r"angular"),
    ("Vue.js", r"vue\.?js"),
    ("CSS", r"\bcss"),
    ("HTML", r"\bhtml"),
    ("SQL", r"sql"),
    ("MongoDB", r"mongo ?db"),
    ("PostgreSQL", r"postgres"),
    ("MySQL", r"mysql"),
    ("AWS", r"\baws\b|amazon web services"),
    ("Azure", r"azure"),
    ("Docker", r"docker"),
    ("Kubernetes", r"kubernetes|\bk8s\b"),
    ("Git", r"\bgit\b"),
    ("Photoshop", r"photoshop"),
    ("Illustrator", r"illustrator"),
    ("Figma", r"figma"),
    ("SEO", r"\bseo\b"),
    ("Marketing", r"marketing"),
    ("Excel", r"\bexcel\b"),
    ("SAP", r"\bsap\b"),
    ("Salesforce", r"salesforce"),
    ("Linux", r"linux"),
    ("Windows Server", r"windows server"),
    ("Django", r"django"),
    ("Flask", r"\bflask\b"),
    ("Spring", r"\bspring\b"),
    (".NET", r"\basp\.net\b|(?:^|\s)\.net\b|dotnet"),
    ("C#", r"\bc#|csharp"),
    ("Swift", r"\bswift\b"),
    ("Kotlin", r"kotlin"),
    ("Flutter", r"flutter"),
    ("React Native", r"react native"),
];

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("static keyword pattern must compile")
}

static CONTRACT_TABLE: LazyLock<Vec<(ContractType, Regex)>> = LazyLock::new(|| {
    CONTRACT_RULES
        .iter()
        .map(|(contract, pattern)| (*contract, compile(pattern)))
        .collect()
});

static CATEGORY_TABLE: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    CATEGORY_RULES
        .iter()
        .map(|(category, pattern)| (*category, compile(pattern)))
        .collect()
});

static CITY_TABLE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    CITY_ALIASES
        .iter()
        .map(|(canonical, aliases)| {
            let alternation = aliases
                .iter()
                .map(|a| regex::escape(a))
                .collect::<Vec<_>>()
                .join("|");
            (*canonical, compile(&format!(r"\b(?:{alternation})\b")))
        })
        .collect()
});

static SKILL_TABLE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SKILL_VOCABULARY
        .iter()
        .map(|(skill, pattern)| (*skill, compile(pattern)))
        .collect()
});

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static RE_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+212[\s.-]?|\b0)[5-7](?:[\s.-]?\d{2}){4}").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Field rules
// ────────────────────────────────────────────────────────────────────────────

/// Total: every input maps to one of the enumerated contract types.
pub fn classify_contract(text: &str) -> ContractType {
    CONTRACT_TABLE
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(contract, _)| *contract)
        .unwrap_or(ContractType::Unspecified)
}

pub fn classify_category(title: &str) -> Category {
    CATEGORY_TABLE
        .iter()
        .find(|(_, re)| re.is_match(title))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// First known city (in table order) mentioned anywhere in `text`.
pub fn detect_city(text: &str) -> Option<&'static str> {
    CITY_TABLE
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(canonical, _)| *canonical)
}

/// All vocabulary skills mentioned in `text`, in vocabulary order, capped at `MAX_SKILLS`.
pub fn extract_skills(text: &str) -> Vec<String> {
    SKILL_TABLE
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(skill, _)| skill.to_string())
        .take(MAX_SKILLS)
        .collect()
}

pub fn extract_email(text: &str) -> Option<String> {
    RE_EMAIL.find(text).map(|m| m.as_str().to_string())
}

/// First Moroccan phone number in `text`, separators stripped.
pub fn extract_phone(text: &str) -> Option<String> {
    RE_PHONE
        .find_iter(text)
        .find(|m| {
            !text[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
        .map(|m| {
            m.as_str()
                .chars()
                .filter(|c| !matches!(c, ' ' | '.' | '-') && !c.is_whitespace())
                .collect()
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Normalize
// ────────────────────────────────────────────────────────────────────────────

pub fn normalize(raw: RawPosting) -> NormalizedPosting {
    let title = raw.title.trim().to_string();
    let company = non_empty(raw.company);
    let location = non_empty(raw.location);
    let description = non_empty(raw.description);
    let contract = non_empty(raw.contract);

    let contract_type = [contract.as_deref(), Some(title.as_str()), description.as_deref()]
        .into_iter()
        .flatten()
        .map(classify_contract)
        .find(|c| *c != ContractType::Unspecified)
        .unwrap_or(ContractType::Unspecified);

    let location_text = format!(
        "{} {} {}",
        title,
        location.as_deref().unwrap_or(""),
        description.as_deref().unwrap_or("")
    );
    let city = detect_city(&location_text).unwrap_or(UNKNOWN_CITY).to_string();

    let skills_text = format!("{} {}", title, description.as_deref().unwrap_or(""));
    let skills = extract_skills(&skills_text);

    let contact_email = raw
        .contact_email
        .as_deref()
        .and_then(extract_email)
        .or_else(|| description.as_deref().and_then(extract_email));
    let contact_phone = raw
        .contact_phone
        .as_deref()
        .and_then(extract_phone)
        .or_else(|| description.as_deref().and_then(extract_phone));

    NormalizedPosting {
        category: classify_category(&title),
        title,
        company,
        location,
        description,
        source_url: non_empty(raw.source_url),
        source_name: raw.source_name.trim().to_string(),
        salary: non_empty(raw.salary),
        contract_type,
        rule_city: city.clone(),
        city,
        skills,
        contact_email,
        contact_phone,
        contact_website: None,
    }
}
