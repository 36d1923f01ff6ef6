use crate::prompts::{ANALYSIS_INSTRUCTIONS, RESPONSE_FORMAT, SOURCE_CLOSE, SOURCE_OPEN, TRUNCATION_MARKER};
use crate::types::{FetchedContent, FetchedFile, RepositoryProfile};
use crate::utils::{char_len, truncate_chars};
use tracing::debug;

/// Assembles the model prompt within a character budget.
///
/// Files arrive highest priority first. When the rendered prompt is over
/// budget, files are dropped from the tail; if the last remaining file alone
/// is still too large its content is cut and marked. Output depends only on
/// the inputs.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn build(&self, repo_url: &str, content: &FetchedContent) -> String {
        self.render(repo_url, content).text
    }

    /// Like [`build`](Self::build), also reporting how many files were kept
    pub fn render(&self, repo_url: &str, content: &FetchedContent) -> BuiltPrompt {
        let header = render_header(repo_url, &content.profile);
        let footer = format!("{}{}", SOURCE_CLOSE, RESPONSE_FORMAT);
        let fixed = char_len(&header) + char_len(&footer);

        let mut prompt = header;
        let mut files_included = 0;
        if fixed >= self.max_chars {
            debug!("Prompt instructions alone fill the {} char budget", self.max_chars);
            prompt.push_str(&footer);
            return BuiltPrompt { text: prompt, files_included };
        }
        let available = self.max_chars - fixed;

        let sections: Vec<String> = content.files.iter().map(render_file).collect();
        let lengths: Vec<usize> = sections.iter().map(|s| char_len(s)).collect();

        let mut keep = sections.len();
        while keep > 1 && lengths[..keep].iter().sum::<usize>() > available {
            keep -= 1;
        }
        if keep < sections.len() {
            debug!("Dropped {} lower-priority files to fit prompt budget", sections.len() - keep);
        }

        if lengths[..keep].iter().sum::<usize>() <= available {
            for section in &sections[..keep] {
                prompt.push_str(section);
            }
            files_included = keep;
        } else if let Some(file) = content.files.first() {
            if let Some(section) = cut_to_fit(file, available) {
                prompt.push_str(&section);
                files_included = 1;
            }
        }

        prompt.push_str(&footer);
        BuiltPrompt { text: prompt, files_included }
    }
}

/// A rendered prompt and the number of file sections it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub text: String,
    pub files_included: usize,
}

fn render_header(repo_url: &str, profile: &RepositoryProfile) -> String {
    format!(
        "{}\nRepository: {}\nProject type: {}\nREADME present: {}\nTests present: {}\n\n{}",
        ANALYSIS_INSTRUCTIONS,
        repo_url,
        profile.project_type,
        yes_no(profile.readme_present),
        yes_no(profile.tests_present),
        SOURCE_OPEN
    )
}

fn file_heading(file: &FetchedFile) -> String {
    if file.truncated {
        format!("--- File: {} (truncated) ---\n", file.path)
    } else {
        format!("--- File: {} ---\n", file.path)
    }
}

fn render_file(file: &FetchedFile) -> String {
    format!("{}{}\n", file_heading(file), file.content)
}

fn cut_to_fit(file: &FetchedFile, available: usize) -> Option<String> {
    let heading = format!("--- File: {} (truncated) ---\n", file.path);
    let overhead = char_len(&heading) + char_len(TRUNCATION_MARKER);
    if overhead >= available {
        return None;
    }

    let (kept, _) = truncate_chars(&file.content, available - overhead);
    Some(format!("{}{}{}", heading, kept, TRUNCATION_MARKER))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
