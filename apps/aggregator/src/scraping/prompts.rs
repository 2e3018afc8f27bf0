// Discovery prompt templates.

pub const DISCOVERY_SYSTEM: &str = "\
You are a job search assistant for Morocco. \
List real, current job postings only and never invent URLs. \
Always answer with a valid JSON array, no markdown fences, no explanations.";

pub const DISCOVERY_PROMPT: &str = r#"List the {count} newest job offers in Morocco posted in the last 3 days.

Focus on high-demand sectors:
- IT: Développeur, Software Engineer, Data Analyst, DevOps, Admin Système
- Commercial: Agent Commercial, Téléconseiller, Service Client
- Finance: Comptable, Analyste Financier
- Ingénierie: Ingénieur, Technicien
- Design: Graphiste, UX/UI Designer
- RH: Recruteur, Responsable RH

Take them from these sites:
{sites}

For each job return:
{
  "title": "Job title",
  "company": "Company name",
  "city": "Casablanca/Rabat/etc or Maroc",
  "contract": "CDI/CDD/Stage",
  "salary": "Salary if mentioned, or null",
  "description": "Brief description",
  "company_email": "Email if found, or null",
  "company_phone": "Phone if found, or null",
  "url": "Job posting URL, or null",
  "source": "website name"
}

Return ONLY a JSON array."#;
