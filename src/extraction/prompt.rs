//! Prompts and response schemas sent to the extraction model

use serde_json::{json, Value};

pub const TEXT_SYSTEM_PROMPT: &str = "You are an assistant for structured data extraction, \
specialized in Brazilian identity documents (RG, CPF, CNH, etc.). \
Always respond with valid JSON only.";

pub const VISION_SYSTEM_PROMPT: &str = "Você é um motor de OCR de precisão para documentos \
brasileiros. Não corrija erros de ortografia do documento. Não remova pontuação. \
Extraia o texto literal.";

pub const VISION_INSTRUCTIONS: &str = "Analise as imagens visualmente. O seu objetivo é \
extração de texto OCR de alta fidelidade.
1. Identifique os campos solicitados.
2. Transcreva o texto EXATAMENTE como ele aparece na imagem (preservando pontos, traços e formatação).
3. Se um campo estiver ilegível ou não existir, retorne null (não invente dados).
4. Se houver múltiplos documentos, separe-os.";

/// User prompt for the text variant; asks for `{"pessoas": [...]}`
pub fn text_prompt(document_text: &str) -> String {
    format!(
        r#"You are an assistant specialized in extracting structured data from Brazilian identity documents
(RG, CPF, CNH, etc.).

The text below may contain data from ONE or MORE different people.

Your task:

1. Identify each distinct person mentioned in the text.
2. For each person, extract ONLY the fields below.

Return the answer STRICTLY as valid JSON, with the format:

{{
  "pessoas": [
    {{
      "nome": string or null,
      "cpf": string or null,
      "rg": string or null,
      "data_nascimento": string or null,
      "genero": string or null,
      "orgao_emissor": string or null,
      "tipo_documento": string or null,
      "numero_documento": string or null
    }}
  ]
}}

Rules:
- Do NOT invent information.
- If a field is not clearly present for a person, use null.
- The same person must not appear twice.
- Use the date format exactly as it appears in the document (for example: "01/01/1990").
- For CPF/RG, keep dots and dashes if they appear in the document.
- For "genero", use the exact text that appears (for example: "MASCULINO", "FEMININO").
- If you cannot find any person, return "pessoas": [].

Document text:

"""{document_text}""""#
    )
}

/// Strict JSON schema for the vision variant
pub fn vision_response_format() -> Value {
    let nullable = |description: &str| json!({ "type": ["string", "null"], "description": description });

    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "analise_documentos",
            "strict": true,
            "schema": {
                "type": "object",
                "additionalProperties": false,
                "required": ["documentos"],
                "properties": {
                    "documentos": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "additionalProperties": false,
                            "required": [
                                "tipo_documento",
                                "nome_completo",
                                "data_nascimento",
                                "numero_rg",
                                "numero_cpf",
                                "filiacao",
                                "genero",
                                "orgao_emissor"
                            ],
                            "properties": {
                                "tipo_documento": nullable("Tipo do documento (RG, CNH, CPF...)."),
                                "nome_completo": nullable("O nome completo da pessoa portadora do documento."),
                                "data_nascimento": nullable("Data de nascimento no formato DD/MM/AAAA."),
                                "numero_rg": nullable("Número do RG, se houver."),
                                "numero_cpf": nullable("Número do CPF, se houver."),
                                "filiacao": {
                                    "type": "array",
                                    "items": { "type": "string" },
                                    "description": "Lista com os nomes dos pais (filiação)."
                                },
                                "genero": nullable("Gênero ou sexo listado no documento, se disponível."),
                                "orgao_emissor": nullable("Órgão emissor do documento (ex: SSP/SP, DETRAN), se disponível.")
                            }
                        }
                    }
                }
            }
        }
    })
}
