// Enrichment prompt templates.
// All prompts sent to AI providers for a single posting are defined here.

pub const ENRICH_SYSTEM: &str = "\
You are a job posting analyzer for the Moroccan market. \
Detect city names written in French or Arabic script. \
Respond with one valid JSON object only, no markdown fences, no explanations. \
Use null for anything the posting does not state.";

pub const ENRICH_PROMPT: &str = r#"Analyze this Moroccan job posting and extract structured information.

Job Title: {title}
Company: {company}
Location: {location}
Description: {description}

Moroccan cities to detect: Casablanca, Rabat, Marrakech, Fès, Tanger, Agadir, Meknès, Oujda, Kénitra, Tétouan, Safi, Mohammedia, El Jadida, Béni Mellal, Nador, Khouribga, Salé, Settat, Larache, Ksar El Kebir, Taza, Laâyoune, Errachidia, Ouarzazate

Return JSON with:
{
  "category": "one of: Tech, Design, Commercial, Customer-Service, Finance, Logistics, Engineering, Health, Education, Hospitality, General",
  "job_type": "one of: CDI, CDD, Stage, Freelance, Interim, or null",
  "skills": ["up to 10 technical skills or tools named in the posting"],
  "summary": "two-sentence summary in French",
  "city": "detected Moroccan city, or Maroc",
  "company_email": "email if present, or null",
  "company_phone": "phone number if present (+212 or 0 format), or null",
  "company_website": "website URL if present, or null"
}"#;
