//! Node API Client
//!
//! HTTP client for the transaction node: pending intent listing and
//! publication, transaction composition, verification, mempool submission,
//! event topic subscription, and remote program execution/proving. Intent
//! and transaction payloads travel base64-encoded in JSON bodies.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Default HTTP request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// WIRE STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct IntentsResponse {
    /// Pending intents as base64 payloads
    intents: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct IntentSubmission {
    intent: String,
}

#[derive(Debug, Clone, Serialize)]
struct ComposeRequest {
    /// Intent payloads to merge, base64-encoded
    transactions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ComposeResponse {
    /// Composed transaction payload, base64-encoded
    transaction: String,
}

#[derive(Debug, Clone, Serialize)]
struct TransactionSubmission {
    transaction: String,
}

#[derive(Debug, Clone, Deserialize)]
struct VerifyResponse {
    /// Whether the payload is structurally and cryptographically valid
    #[serde(rename = "valid?")]
    valid: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageResponse {
    message: String,
}

/// Error body the node returns with a non-success status.
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Clone, Serialize)]
struct SubscribeRequest {
    topic: String,
}

#[derive(Debug, Clone, Serialize)]
struct RunRequest {
    program: String,
    inputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ProveRequest {
    program: String,
    private_inputs: Vec<String>,
    public_inputs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProgramResponse {
    result: String,
    #[serde(default)]
    io: Vec<String>,
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of a composition attempt.
///
/// Rejection is an expected, frequent outcome and is distinct from transport
/// or protocol errors, which surface as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// The node merged the intents into a single transaction payload.
    Composed(Vec<u8>),
    /// The node refused the combination.
    Rejected {
        /// Error headline from the node
        error: String,
        /// Rejection reason detail
        reason: String,
    },
}

/// Node acknowledgement for intent publication and mempool submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAck {
    /// The node accepted the payload.
    Accepted {
        /// Acknowledgement message from the node
        message: String,
    },
    /// The node rejected the payload.
    Rejected {
        /// Error headline from the node
        error: String,
        /// Rejection reason detail
        reason: String,
    },
}

/// Output of remote program execution or proving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOutput {
    /// Program result payload
    pub result: Vec<u8>,
    /// Hints emitted during execution
    pub io: Vec<Vec<u8>>,
}

// ============================================================================
// COMPOSITION CAPABILITY
// ============================================================================

/// The node capabilities the solver consumes during a matching pass.
///
/// Implemented by [`NodeClient`]; tests substitute scripted implementations.
pub trait CompositionApi {
    /// Attempt to merge two or more intent payloads into one transaction.
    fn compose(&self, intents: &[Vec<u8>]) -> Result<ComposeOutcome>;

    /// Check structural and cryptographic validity of a composed payload.
    fn verify(&self, transaction: &[u8]) -> Result<bool>;

    /// Enqueue a composed payload for network inclusion.
    fn submit(&self, transaction: &[u8]) -> Result<NodeAck>;
}

// ============================================================================
// NODE CLIENT
// ============================================================================

/// HTTP client for communicating with the transaction node.
///
/// Uses blocking HTTP requests (reqwest blocking client). All methods return
/// `Result` with appropriate error context.
pub struct NodeClient {
    /// Base URL of the node's HTTP API (e.g., "http://127.0.0.1:4000")
    base_url: String,
    /// HTTP client instance
    client: reqwest::blocking::Client,
}

impl NodeClient {
    /// Create a new node client with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new node client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// List the node's pending intents.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Vec<u8>>)` - Decoded intent payloads
    /// * `Err(anyhow::Error)` - Failed to fetch or decode intents
    pub fn list_intents(&self) -> Result<Vec<Vec<u8>>> {
        let url = format!("{}/intents", self.base_url);

        let response: IntentsResponse = self
            .client
            .get(&url)
            .send()
            .context("Failed to send GET /intents request")?
            .error_for_status()
            .context("GET /intents returned an error status")?
            .json()
            .context("Failed to parse GET /intents response")?;

        response
            .intents
            .iter()
            .map(|intent| {
                STANDARD
                    .decode(intent)
                    .context("Intent payload is not valid base64")
            })
            .collect()
    }

    /// Publish an intent payload to the node's intent pool.
    ///
    /// # Arguments
    ///
    /// * `intent` - Raw intent payload bytes
    ///
    /// # Returns
    ///
    /// * `Ok(NodeAck)` - The node's acceptance or structured rejection
    /// * `Err(anyhow::Error)` - Transport or protocol failure
    pub fn add_intent(&self, intent: &[u8]) -> Result<NodeAck> {
        let url = format!("{}/intents", self.base_url);
        let request = IntentSubmission {
            intent: STANDARD.encode(intent),
        };
        self.ack_post(&url, &request, "POST /intents")
    }

    /// Attempt to merge two or more intent payloads into one transaction.
    ///
    /// A structured rejection from the node (the combination does not
    /// compose) is returned as `ComposeOutcome::Rejected`, not as an error.
    ///
    /// # Arguments
    ///
    /// * `intents` - Intent payloads of the candidate subset
    ///
    /// # Returns
    ///
    /// * `Ok(ComposeOutcome)` - Composed payload or structured rejection
    /// * `Err(anyhow::Error)` - Transport or protocol failure
    pub fn compose(&self, intents: &[Vec<u8>]) -> Result<ComposeOutcome> {
        let url = format!("{}/transactions/compose", self.base_url);
        let request = ComposeRequest {
            transactions: intents.iter().map(|i| STANDARD.encode(i)).collect(),
        };

        let http_response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .context("Failed to send POST /transactions/compose request")?;

        if http_response.status().is_success() {
            let response: ComposeResponse = http_response
                .json()
                .context("Failed to parse POST /transactions/compose response")?;
            let transaction = STANDARD
                .decode(&response.transaction)
                .context("Composed transaction is not valid base64")?;
            Ok(ComposeOutcome::Composed(transaction))
        } else {
            let response: ErrorResponse = http_response
                .json()
                .context("Failed to parse POST /transactions/compose error response")?;
            Ok(ComposeOutcome::Rejected {
                error: response.error,
                reason: response.reason,
            })
        }
    }

    /// Check validity of a composed transaction payload.
    ///
    /// # Arguments
    ///
    /// * `transaction` - Composed transaction payload bytes
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - The node's verdict
    /// * `Err(anyhow::Error)` - Transport or protocol failure
    pub fn verify(&self, transaction: &[u8]) -> Result<bool> {
        let url = format!("{}/transactions/verify", self.base_url);
        let request = TransactionSubmission {
            transaction: STANDARD.encode(transaction),
        };

        let response: VerifyResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .context("Failed to send POST /transactions/verify request")?
            .error_for_status()
            .context("POST /transactions/verify returned an error status")?
            .json()
            .context("Failed to parse POST /transactions/verify response")?;

        Ok(response.valid)
    }

    /// Submit a composed transaction to the node's mempool.
    ///
    /// # Arguments
    ///
    /// * `transaction` - Composed transaction payload bytes
    ///
    /// # Returns
    ///
    /// * `Ok(NodeAck)` - The node's acceptance or structured rejection
    /// * `Err(anyhow::Error)` - Transport or protocol failure
    pub fn submit(&self, transaction: &[u8]) -> Result<NodeAck> {
        let url = format!("{}/mempool/add", self.base_url);
        let request = TransactionSubmission {
            transaction: STANDARD.encode(transaction),
        };
        self.ack_post(&url, &request, "POST /mempool/add")
    }

    /// Subscribe to an event topic before opening the WebSocket stream.
    ///
    /// # Arguments
    ///
    /// * `topic` - Topic name, e.g. `tx_events` or `*`
    pub fn subscribe(&self, topic: &str) -> Result<()> {
        let url = format!("{}/subscribe", self.base_url);
        let request = SubscribeRequest {
            topic: topic.to_string(),
        };

        self.client
            .post(&url)
            .json(&request)
            .send()
            .context("Failed to send POST /subscribe request")?
            .error_for_status()
            .context("POST /subscribe returned an error status")?;

        Ok(())
    }

    /// Execute a program on the node's virtual machine.
    ///
    /// # Arguments
    ///
    /// * `program` - Encoded program payload
    /// * `inputs` - Encoded input payloads
    ///
    /// # Returns
    ///
    /// * `Ok(ProgramOutput)` - Result payload and emitted hints
    /// * `Err(anyhow::Error)` - Transport or protocol failure
    pub fn run_program(&self, program: &[u8], inputs: &[Vec<u8>]) -> Result<ProgramOutput> {
        let url = format!("{}/vm/run", self.base_url);
        let request = RunRequest {
            program: STANDARD.encode(program),
            inputs: inputs.iter().map(|i| STANDARD.encode(i)).collect(),
        };

        let response: ProgramResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .context("Failed to send POST /vm/run request")?
            .error_for_status()
            .context("POST /vm/run returned an error status")?
            .json()
            .context("Failed to parse POST /vm/run response")?;

        decode_program_output(response)
    }

    /// Prove a program execution on the node.
    ///
    /// # Arguments
    ///
    /// * `program` - Encoded program payload
    /// * `private_inputs` - Encoded private input payloads
    /// * `public_inputs` - Encoded public input payloads
    ///
    /// # Returns
    ///
    /// * `Ok(ProgramOutput)` - Result payload and emitted hints
    /// * `Err(anyhow::Error)` - Transport or protocol failure
    pub fn prove_program(
        &self,
        program: &[u8],
        private_inputs: &[Vec<u8>],
        public_inputs: &[Vec<u8>],
    ) -> Result<ProgramOutput> {
        let url = format!("{}/vm/prove", self.base_url);
        let request = ProveRequest {
            program: STANDARD.encode(program),
            private_inputs: private_inputs.iter().map(|i| STANDARD.encode(i)).collect(),
            public_inputs: public_inputs.iter().map(|i| STANDARD.encode(i)).collect(),
        };

        let response: ProgramResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .context("Failed to send POST /vm/prove request")?
            .error_for_status()
            .context("POST /vm/prove returned an error status")?
            .json()
            .context("Failed to parse POST /vm/prove response")?;

        decode_program_output(response)
    }

    /// POST a payload to an endpoint that answers with a message on success
    /// and an error/reason body on rejection.
    fn ack_post<T: Serialize>(&self, url: &str, request: &T, label: &str) -> Result<NodeAck> {
        let http_response = self
            .client
            .post(url)
            .json(request)
            .send()
            .with_context(|| format!("Failed to send {} request", label))?;

        if http_response.status().is_success() {
            let response: MessageResponse = http_response
                .json()
                .with_context(|| format!("Failed to parse {} response", label))?;
            Ok(NodeAck::Accepted {
                message: response.message,
            })
        } else {
            let response: ErrorResponse = http_response
                .json()
                .with_context(|| format!("Failed to parse {} error response", label))?;
            Ok(NodeAck::Rejected {
                error: response.error,
                reason: response.reason,
            })
        }
    }
}

impl CompositionApi for NodeClient {
    fn compose(&self, intents: &[Vec<u8>]) -> Result<ComposeOutcome> {
        NodeClient::compose(self, intents)
    }

    fn verify(&self, transaction: &[u8]) -> Result<bool> {
        NodeClient::verify(self, transaction)
    }

    fn submit(&self, transaction: &[u8]) -> Result<NodeAck> {
        NodeClient::submit(self, transaction)
    }
}

fn decode_program_output(response: ProgramResponse) -> Result<ProgramOutput> {
    let result = STANDARD
        .decode(&response.result)
        .context("Program result is not valid base64")?;
    let io = response
        .io
        .iter()
        .map(|hint| {
            STANDARD
                .decode(hint)
                .context("Program hint is not valid base64")
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ProgramOutput { result, io })
}
