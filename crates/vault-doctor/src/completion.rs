//! Static shell completion scripts.

use std::fmt;

const BASH: &str = r#"# bash completion for vault_doctor
_vault_doctor()
{
    local cur prev words cword
    _init_completion || return

    local subcmds="medic completion -h --help -V --version"
    local global_flags="-h --help -V --version"
    local medic_flags="--json --quiet --no-color --addr --token --role-id --secret-id"
    medic_flags+=" --namespace --skip-verify --log-level --log-format"

    if [[ ${#COMP_WORDS[@]} -le 2 ]]; then
        COMPREPLY=( $(compgen -W "${subcmds}" -- "$cur") )
        return
    fi

    case "${COMP_WORDS[1]}" in
        medic)
            COMPREPLY=( $(compgen -W "${medic_flags}" -- "$cur") )
            ;;
        completion)
            COMPREPLY=( $(compgen -W "bash zsh fish" -- "$cur") )
            ;;
        *)
            COMPREPLY=( $(compgen -W "${global_flags}" -- "$cur") )
            ;;
    esac
}
complete -F _vault_doctor vault_doctor
"#;

const ZSH: &str = r#"#compdef vault_doctor

local -a subcmds
subcmds=(
  'medic:Run diagnostics'
  'completion:Generate shell completions'
  '-h:Help' '--help:Help'
  '-V:Version' '--version:Version'
)

_arguments -C \
  '1: :->subcmd' \
  '*::arg:->args'

if [[ $state == subcmd ]]; then
  _describe 'command' subcmds
  return
fi

case $words[1] in
  medic)
    _values 'flags' --json --quiet --no-color --addr --token --role-id --secret-id \
      --namespace --skip-verify --log-level --log-format
    ;;
  completion)
    _values 'shell' bash zsh fish
    ;;
  *)
    _values 'global' -h --help -V --version
    ;;
esac
"#;

const FISH: &str = r#"# fish completion for vault_doctor
complete -c vault_doctor -f -n "__fish_use_subcommand" -a "medic" -d "Run diagnostics"
complete -c vault_doctor -f -n "__fish_use_subcommand" -a "completion" \
    -d "Generate shell completions"

# medic flags
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l json -d "Output JSON"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l quiet -d "Quiet mode"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l no-color -d "Disable colors"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l addr -r -d "Cluster address"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l token -r -d "Token"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l role-id -r -d "Role ID"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l secret-id -r -d "Secret ID"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l namespace -r -d "Namespace"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l skip-verify -a "true false" \
    -d "Skip TLS verification"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l log-format -a "text json" \
    -d "Log format"
complete -c vault_doctor -n "__fish_seen_subcommand_from medic" -l log-level -r -d "Log level"

# completion args
complete -c vault_doctor -n "__fish_seen_subcommand_from completion" -a "bash zsh fish"
"#;

pub const USAGE: &str = "Usage: vault_doctor completion [bash|zsh|fish]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedShell(pub String);

impl fmt::Display for UnsupportedShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported shell: {} (use bash|zsh|fish)", self.0)
    }
}

impl std::error::Error for UnsupportedShell {}

/// Completion script for `shell`, matched case-insensitively.
pub fn script(shell: &str) -> Result<&'static str, UnsupportedShell> {
    match shell.to_ascii_lowercase().as_str() {
        "bash" => Ok(BASH),
        "zsh" => Ok(ZSH),
        "fish" => Ok(FISH),
        _ => Err(UnsupportedShell(shell.to_ascii_lowercase())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shells_case_insensitive() {
        assert!(script("bash").unwrap().contains("complete -F _vault_doctor vault_doctor"));
        assert!(script("ZSH").unwrap().starts_with("#compdef vault_doctor"));
        assert!(script("Fish").unwrap().contains("__fish_use_subcommand"));
    }

    #[test]
    fn every_script_offers_every_medic_flag() {
        const FLAGS: [&str; 11] = [
            "json", "quiet", "no-color", "addr", "token", "role-id", "secret-id", "namespace",
            "skip-verify", "log-level", "log-format",
        ];
        for flag in FLAGS {
            assert!(BASH.contains(&format!("--{flag}")), "bash missing {flag}");
            assert!(ZSH.contains(&format!("--{flag}")), "zsh missing {flag}");
            assert!(FISH.contains(&format!("-l {flag} ")), "fish missing {flag}");
        }
    }

    #[test]
    fn unsupported_shell_message() {
        let err = script("PowerShell").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported shell: powershell (use bash|zsh|fish)");
    }
}
