//! Prompts for registrant extraction, requirement listing and responses
//!
//! Licences are issued in Portuguese, so the prompts are too.

use ecodefense_domain::VerbosityMode;

const REGISTRANT_INSTRUCTIONS: &str = "\
Você recebe o início de uma licença ambiental. Identifique o empreendimento \
licenciado e devolva apenas as quatro linhas abaixo, sem comentários, \
deixando o valor em branco quando a informação não aparecer no texto:";

const REGISTRANT_FORMAT: &str = "\
EMPRESA: <razão social>
CNPJ: <número do CNPJ>
ENDERECO: <endereço do empreendimento>
CIDADE: <município>";

const REQUIREMENTS_INSTRUCTIONS: &str = "\
Você é um analista de licenciamento ambiental. Leia o texto da licença abaixo \
e liste todas as condicionantes e exigências técnicas que o empreendedor \
precisa cumprir. Transcreva cada exigência de forma completa, na ordem em \
que aparece, sem numeração e sem comentários.";

const RESPONSE_ROLE: &str = "\
Você é um engenheiro ambiental sênior redigindo a resposta formal de uma \
empresa a uma exigência do órgão licenciador.";

const RESPONSE_STYLE: &str = "\
Regras de redação:
- use voz passiva e linguagem impessoal;
- não repita nem parafraseie o texto da exigência;
- baseie-se somente nas informações do contexto; se o contexto não trouxer \
dados suficientes, afirme o atendimento em termos gerais sem inventar \
números, datas ou documentos;
- escreva em português técnico, sem títulos e sem listas.";

/// Instruction block for a verbosity mode
pub fn mode_instruction(mode: VerbosityMode) -> &'static str {
    match mode {
        VerbosityMode::Terse => {
            "Extensão: no máximo um parágrafo curto, apenas confirmando o atendimento da exigência."
        }
        VerbosityMode::Balanced => {
            "Extensão: cerca de dois parágrafos, confirmando o atendimento e apresentando uma breve justificativa técnica."
        }
        VerbosityMode::Detailed => {
            "Extensão: de três a quatro parágrafos, com a justificativa técnica completa, citando procedimentos, controles e evidências presentes no contexto."
        }
    }
}

/// Registrant prompt over the first `max_chars` characters of `text`
pub fn registrant_prompt(text: &str, max_chars: usize) -> String {
    let excerpt = truncate_chars(text, max_chars);
    format!(
        "{REGISTRANT_INSTRUCTIONS}\n\n{REGISTRANT_FORMAT}\n\nTexto:\n---\n{excerpt}\n---\n"
    )
}

/// Requirement listing prompt; the model separates items with `delimiter`
pub fn requirements_prompt(text: &str, delimiter: &str) -> String {
    format!(
        "{REQUIREMENTS_INSTRUCTIONS}\n\
         Separe uma exigência da outra usando exclusivamente o marcador {delimiter} \
         e não use esse marcador em nenhum outro lugar.\n\n\
         Texto da licença:\n---\n{text}\n---\n"
    )
}

/// Builds the response prompt for one requirement
pub struct ResponsePromptBuilder<'a> {
    requirement: &'a str,
    context: &'a str,
    mode: VerbosityMode,
}

impl<'a> ResponsePromptBuilder<'a> {
    /// Prompt for `requirement` with no context
    pub fn new(requirement: &'a str) -> Self {
        Self {
            requirement,
            context: "",
            mode: VerbosityMode::default(),
        }
    }

    /// Retrieved context, passages joined by newlines
    pub fn with_context(mut self, context: &'a str) -> Self {
        self.context = context;
        self
    }

    /// Verbosity mode
    pub fn with_mode(mut self, mode: VerbosityMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(RESPONSE_ROLE);
        prompt.push_str("\n\n");
        prompt.push_str(RESPONSE_STYLE);
        prompt.push('\n');
        prompt.push_str(mode_instruction(self.mode));
        prompt.push_str("\n\n");

        prompt.push_str("Contexto:\n---\n");
        if self.context.trim().is_empty() {
            prompt.push_str("(nenhum contexto disponível)");
        } else {
            prompt.push_str(self.context);
        }
        prompt.push_str("\n---\n\n");

        prompt.push_str("Exigência:\n---\n");
        prompt.push_str(self.requirement);
        prompt.push_str("\n---\n\nResposta:");

        prompt
    }
}

/// Response prompt for `requirement` grounded in `context`
pub fn response_prompt(requirement: &str, context: &str, mode: VerbosityMode) -> String {
    ResponsePromptBuilder::new(requirement)
        .with_context(context)
        .with_mode(mode)
        .build()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
