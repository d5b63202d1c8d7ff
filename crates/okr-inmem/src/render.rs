//! Natural-language sentences attached to DTOs as `prompt_template`

use okr_dispatch::{
    EntityDto, KeyResultDto, KeyResultTaskDto, Listing, ObjectiveDto, OkrSessionDto, Operation, TeamDto, UserDto,
};

/// DTO that can describe itself in one clause
pub(crate) trait Describe: EntityDto + Clone {
    fn summary(&self) -> String;

    fn template_mut(&mut self) -> &mut String;
}

fn percent(progress: f64) -> String {
    format!("{progress:.0}% complete")
}

impl Describe for ObjectiveDto {
    fn summary(&self) -> String {
        format!("status {:?}, {}", self.status, percent(self.progress))
    }

    fn template_mut(&mut self) -> &mut String {
        &mut self.prompt_template
    }
}

impl Describe for KeyResultDto {
    fn summary(&self) -> String {
        format!("status {:?}, {}", self.status, percent(self.progress))
    }

    fn template_mut(&mut self) -> &mut String {
        &mut self.prompt_template
    }
}

impl Describe for KeyResultTaskDto {
    fn summary(&self) -> String {
        let assignee = if self.collaborator_id.is_some() { "assigned" } else { "unassigned" };
        format!(
            "status {:?}, priority {:?}, {}, {assignee}",
            self.status,
            self.priority,
            percent(self.progress)
        )
    }

    fn template_mut(&mut self) -> &mut String {
        &mut self.prompt_template
    }
}

impl Describe for TeamDto {
    fn summary(&self) -> String {
        match self.member_ids.len() {
            1 => "1 member".to_string(),
            n => format!("{n} members"),
        }
    }

    fn template_mut(&mut self) -> &mut String {
        &mut self.prompt_template
    }
}

impl Describe for OkrSessionDto {
    fn summary(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!(
                "status {:?}, {} to {}",
                self.status,
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
            _ => format!("status {:?}", self.status),
        }
    }

    fn template_mut(&mut self) -> &mut String {
        &mut self.prompt_template
    }
}

impl Describe for UserDto {
    fn summary(&self) -> String {
        format!("{}, role {}", self.display_name(), self.role)
    }

    fn template_mut(&mut self) -> &mut String {
        &mut self.prompt_template
    }
}

/// Attach the sentence for `operation` to the DTO
pub(crate) fn stamp<T: Describe>(mut dto: T, operation: Operation) -> T {
    let label = T::ENTITY_TYPE.label();
    let sentence = match operation {
        Operation::Create => format!("Created {label} '{}': {}.", dto.title(), dto.summary()),
        Operation::Update => format!("Updated {label} '{}': {}.", dto.title(), dto.summary()),
        Operation::Delete => format!("Deleted {label} '{}'.", dto.title()),
        Operation::View | Operation::Search => format!("{label} '{}': {}.", dto.title(), dto.summary()),
        Operation::Invite => format!("Invited '{}' as {}.", dto.title(), dto.summary()),
    };
    *dto.template_mut() = capitalize(&sentence);
    dto
}

/// Wrap search hits in a listing with a summary sentence
pub(crate) fn listing<T: Describe>(items: Vec<T>) -> Listing<T> {
    let label = T::ENTITY_TYPE.label();
    let sentence = match items.as_slice() {
        [] => format!("I found no {label}s."),
        [only] => format!("I found 1 {label}: '{}'.", only.title()),
        many => {
            let titles: Vec<String> = many.iter().map(|item| format!("'{}'", item.title())).collect();
            format!("I found {} {label}s: {}.", many.len(), titles.join(", "))
        }
    };
    let items = items.into_iter().map(|item| stamp(item, Operation::Search)).collect();
    Listing::new(items, sentence)
}

fn capitalize(sentence: &str) -> String {
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
