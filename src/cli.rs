use clap::{Parser, Subcommand};

/// Manage policies and tokens on a tokenizer deployment
#[derive(Parser)]
#[command(name = "tokenizer", version, about)]
pub struct Cli {
    /// Per-call deadline in seconds (overrides TOKENIZER_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage generation policies (immutable once created)
    GenerationPolicy {
        #[command(subcommand)]
        command: GenerationPolicyCommands,
    },

    /// Manage access policies (versioned)
    AccessPolicy {
        #[command(subcommand)]
        command: AccessPolicyCommands,
    },

    /// Create, resolve and inspect tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum GenerationPolicyCommands {
    /// List generation policies
    List,
    /// Create a generation policy
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        function: String,
        #[arg(long, default_value = "{}")]
        parameters: String,
        /// Client-chosen id (random when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Permanently delete a generation policy
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AccessPolicyCommands {
    /// List access policies
    List,
    /// Create an access policy at version 1
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        function: String,
        #[arg(long, default_value = "{}")]
        parameters: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Update an access policy; --version is the version you last saw
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        version: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        function: String,
        #[arg(long, default_value = "{}")]
        parameters: String,
    },
    /// Permanently delete an access policy at the given version
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        version: u64,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Tokenize a value
    Create {
        #[arg(long)]
        data: String,
        /// Policy id or built-in name (uuid, email, full_name, ssn, credit_card)
        #[arg(long, default_value = "uuid")]
        generation_policy: String,
        /// Policy id or "open"
        #[arg(long, default_value = "open")]
        access_policy: String,
    },
    /// Resolve a token back to its value
    Resolve {
        #[arg(long)]
        token: String,
        /// JSON object the access policy is evaluated against
        #[arg(long, default_value = "{}")]
        context: String,
    },
    /// Delete a token
    Delete {
        #[arg(long)]
        token: String,
    },
    /// Show token metadata and its bound policies
    Inspect {
        #[arg(long)]
        token: String,
    },
    /// Find every token created from a value under a policy pair
    Lookup {
        #[arg(long)]
        data: String,
        #[arg(long, default_value = "uuid")]
        generation_policy: String,
        #[arg(long, default_value = "open")]
        access_policy: String,
    },
}
