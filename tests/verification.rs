use ethabi::Address;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::{num::NonZeroUsize, path::Path, str::FromStr, time::Duration};
use url::Url;
use verification_runner::{
    verifier::VerificationError, ArtifactsSettings, EtherscanSettings, Settings,
    VerificationTarget,
};
use wiremock::{
    matchers::{body_string_contains, method, query_param},
    Mock, MockServer, ResponseTemplate,
};

const TOKEN: &str = "0xf8b3ab36e079598524f83094b98d7d2688cde09c";
const BUSD: &str = "0x2277dee895165127198beaac84444ae0fb37adf5";
const VESTING: &str = "0x512f0133ded486c9d213e38bb524cf5e45fa08fa";
const ADMIN: &str = "0x00000000000000000000000000000000000000ad";

// {"solc": 0x000811}
const AUXDATA: &str = "a164736f6c6343000811000a";

fn write_build_info(dir: &Path) {
    let build_info = json!({
        "_format": "hh-sol-build-info-1",
        "solcVersion": "0.8.17",
        "solcLongVersion": "0.8.17+commit.8df45f5f",
        "input": {
            "language": "Solidity",
            "sources": {
                "contracts/Token.sol": {"content": "contract Token {}"},
                "contracts/Vesting.sol": {"content": "contract Vesting {}"}
            },
            "settings": {"optimizer": {"enabled": true, "runs": 200}}
        },
        "output": {
            "contracts": {
                "contracts/Token.sol": {
                    "Token": {
                        "abi": [{
                            "inputs": [
                                {"internalType": "address[]", "name": "admins", "type": "address[]"}
                            ],
                            "stateMutability": "nonpayable",
                            "type": "constructor"
                        }],
                        "evm": {"deployedBytecode": {"object": format!("6080604052{AUXDATA}")}}
                    }
                },
                "contracts/Vesting.sol": {
                    "Vesting": {
                        "abi": [],
                        "evm": {"deployedBytecode": {"object": format!("6080604053{AUXDATA}")}}
                    }
                }
            }
        }
    });
    std::fs::write(dir.join("8f1e.json"), build_info.to_string()).unwrap();
}

fn target(address: &str) -> VerificationTarget {
    VerificationTarget::new(Address::from_str(address).unwrap())
}

fn settings(
    server: &MockServer,
    build_info_path: &Path,
    targets: Vec<VerificationTarget>,
) -> Settings {
    Settings {
        etherscan: EtherscanSettings {
            api_url: Url::parse(&format!("{}/api", server.uri())).unwrap(),
            api_key: Some("api-key".into()),
            chain_id: None,
            request_timeout: Duration::from_secs(5),
            status_poll_interval: Duration::ZERO,
            status_poll_attempts: NonZeroUsize::new(3).unwrap(),
        },
        artifacts: ArtifactsSettings {
            build_info_path: build_info_path.to_path_buf(),
        },
        targets,
    }
}

fn api_response(status: &str, result: serde_json::Value) -> ResponseTemplate {
    let message = if status == "1" { "OK" } else { "NOTOK" };
    ResponseTemplate::new(200).set_body_json(json!({
        "status": status,
        "message": message,
        "result": result
    }))
}

async fn mock_source_code(server: &MockServer, address: &str, source_code: &str) {
    Mock::given(method("GET"))
        .and(query_param("action", "getsourcecode"))
        .and(query_param("address", address))
        .respond_with(api_response(
            "1",
            json!([{"SourceCode": source_code, "ContractName": "", "CompilerVersion": ""}]),
        ))
        .expect(1)
        .mount(server)
        .await;
}

async fn mock_status(server: &MockServer, guid: &str, result: &str, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(query_param("action", "checkverifystatus"))
        .and(query_param("guid", guid))
        .respond_with(api_response("0", json!(result)));
    let mock = match times {
        Some(times) => mock.up_to_n_times(times),
        None => mock,
    };
    mock.mount(server).await;
}

#[tokio::test]
async fn verify_contracts_sequentially() {
    let server = MockServer::start().await;
    let build_info_dir = tempfile::tempdir().unwrap();
    write_build_info(build_info_dir.path());

    mock_source_code(&server, TOKEN, "").await;
    mock_source_code(&server, BUSD, "contract Busd {}").await;
    mock_source_code(&server, VESTING, "").await;

    Mock::given(method("GET"))
        .and(query_param("action", "eth_getCode"))
        .and(query_param("address", VESTING))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": format!("0x6080604053{AUXDATA}")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token_constructor_arguments = concat!(
        "0000000000000000000000000000000000000000000000000000000000000020",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "00000000000000000000000000000000000000000000000000000000000000ad",
    );
    Mock::given(method("POST"))
        .and(query_param("action", "verifysourcecode"))
        .and(body_string_contains(format!("contractaddress={TOKEN}")))
        .and(body_string_contains(
            "contractname=contracts%2FToken.sol%3AToken",
        ))
        .and(body_string_contains(
            "compilerversion=v0.8.17%2Bcommit.8df45f5f",
        ))
        .and(body_string_contains(format!(
            "constructorArguements={token_constructor_arguments}"
        )))
        .respond_with(api_response("1", json!("guid-token")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(format!("contractaddress={BUSD}")))
        .respond_with(api_response("1", json!("guid-busd")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("action", "verifysourcecode"))
        .and(body_string_contains(format!("contractaddress={VESTING}")))
        .and(body_string_contains(
            "contractname=contracts%2FVesting.sol%3AVesting",
        ))
        .respond_with(api_response("1", json!("guid-vesting")))
        .expect(1)
        .mount(&server)
        .await;

    mock_status(&server, "guid-token", "Pending in queue", Some(1)).await;
    mock_status(&server, "guid-token", "Pass - Verified", None).await;
    mock_status(&server, "guid-vesting", "Pass - Verified", None).await;

    let targets = vec![
        target(TOKEN)
            .with_contract("Token")
            .with_constructor_arguments(vec![json!([ADMIN])]),
        target(BUSD),
        target(VESTING),
    ];
    let report = verification_runner::run(settings(&server, build_info_dir.path(), targets))
        .await
        .expect("run should complete");

    let addresses: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| format!("{:#x}", outcome.address))
        .collect();
    assert_eq!(vec![TOKEN, BUSD, VESTING], addresses);

    let token = report.outcomes[0].result.as_ref().expect("token verified");
    assert_eq!("contracts/Token.sol:Token", token.contract_name);
    assert_eq!("guid-token", token.guid);
    assert!(
        matches!(
            report.outcomes[1].result,
            Err(VerificationError::AlreadyVerified)
        ),
        "expected: 'AlreadyVerified', got: {:?}",
        report.outcomes[1].result
    );
    let vesting = report.outcomes[2].result.as_ref().expect("vesting verified");
    assert_eq!("contracts/Vesting.sol:Vesting", vesting.contract_name);

    assert_eq!(2, report.succeeded());
    assert_eq!(1, report.failed());
}

#[tokio::test]
async fn verification_failures_are_isolated() {
    let server = MockServer::start().await;
    let build_info_dir = tempfile::tempdir().unwrap();
    write_build_info(build_info_dir.path());

    mock_source_code(&server, TOKEN, "").await;
    mock_source_code(&server, BUSD, "").await;
    mock_source_code(&server, VESTING, "").await;

    Mock::given(method("POST"))
        .and(body_string_contains(format!("contractaddress={TOKEN}")))
        .respond_with(api_response("1", json!("guid-token")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(format!("contractaddress={VESTING}")))
        .respond_with(api_response("0", json!("Max rate limit reached")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("action", "eth_getCode"))
        .and(query_param("address", BUSD))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": "0x"
        })))
        .expect(1)
        .mount(&server)
        .await;
    // Status checks are not retries of the submission.
    Mock::given(method("GET"))
        .and(query_param("action", "checkverifystatus"))
        .respond_with(api_response("0", json!("Pending in queue")))
        .expect(3)
        .mount(&server)
        .await;

    let targets = vec![
        target(TOKEN)
            .with_contract("contracts/Token.sol:Token")
            .with_constructor_arguments(vec![json!([ADMIN])]),
        target(BUSD),
        target(VESTING).with_contract("Vesting"),
    ];
    let report = verification_runner::run(settings(&server, build_info_dir.path(), targets))
        .await
        .expect("run should complete");

    assert_eq!(3, report.failed());
    let errors: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| outcome.result.as_ref().expect_err("failure expected"))
        .collect();
    assert!(
        matches!(
            errors[0],
            VerificationError::StatusPollingExhausted { attempts: 3, .. }
        ),
        "got: {:?}",
        errors[0]
    );
    assert!(
        matches!(errors[1], VerificationError::NoDeployedCode),
        "got: {:?}",
        errors[1]
    );
    assert!(
        matches!(errors[2], VerificationError::Rejected(_)),
        "got: {:?}",
        errors[2]
    );
}

#[tokio::test]
async fn invalid_constructor_arguments_are_reported_per_target() {
    let server = MockServer::start().await;
    let build_info_dir = tempfile::tempdir().unwrap();
    write_build_info(build_info_dir.path());

    mock_source_code(&server, TOKEN, "").await;
    Mock::given(method("POST"))
        .respond_with(api_response("1", json!("guid")))
        .expect(0)
        .mount(&server)
        .await;

    let targets = vec![target(TOKEN).with_contract("Token")];
    let report = verification_runner::run(settings(&server, build_info_dir.path(), targets))
        .await
        .expect("run should complete");

    let result = &report.outcomes[0].result;
    assert!(
        matches!(result, Err(VerificationError::InvalidConstructorArguments(_))),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn contract_compiled_twice_is_selected_by_deployed_code() {
    let server = MockServer::start().await;
    let build_info_dir = tempfile::tempdir().unwrap();
    write_build_info(build_info_dir.path());
    let older_build_info = json!({
        "_format": "hh-sol-build-info-1",
        "solcVersion": "0.8.9",
        "solcLongVersion": "0.8.9+commit.e5eed63a",
        "input": {
            "language": "Solidity",
            "sources": {"contracts/Token.sol": {"content": "contract Token {}"}},
            "settings": {"optimizer": {"enabled": false, "runs": 200}}
        },
        "output": {
            "contracts": {
                "contracts/Token.sol": {
                    "Token": {
                        "abi": [{
                            "inputs": [
                                {"internalType": "address[]", "name": "admins", "type": "address[]"}
                            ],
                            "stateMutability": "nonpayable",
                            "type": "constructor"
                        }],
                        "evm": {"deployedBytecode": {
                            "object": "6080604060a164736f6c6343000809000a"
                        }}
                    }
                }
            }
        }
    });
    std::fs::write(
        build_info_dir.path().join("1c3d.json"),
        older_build_info.to_string(),
    )
    .unwrap();

    mock_source_code(&server, TOKEN, "").await;
    Mock::given(method("GET"))
        .and(query_param("action", "eth_getCode"))
        .and(query_param("address", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": "0x6080604060a164736f6c6343000809000a"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("action", "verifysourcecode"))
        .and(body_string_contains("compilerversion=v0.8.9%2Bcommit.e5eed63a"))
        .respond_with(api_response("1", json!("guid-token")))
        .expect(1)
        .mount(&server)
        .await;
    mock_status(&server, "guid-token", "Pass - Verified", None).await;

    let targets = vec![target(TOKEN)
        .with_contract("contracts/Token.sol:Token")
        .with_constructor_arguments(vec![json!([ADMIN])])];
    let report = verification_runner::run(settings(&server, build_info_dir.path(), targets))
        .await
        .expect("run should complete");

    let token = report.outcomes[0].result.as_ref().expect("token verified");
    assert_eq!("guid-token", token.guid);
}

#[tokio::test]
async fn setup_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("build-info");

    let result =
        verification_runner::run(settings(&server, &missing, vec![target(TOKEN)])).await;
    assert!(result.is_err(), "missing build artifacts should be fatal");

    let report = verification_runner::run(settings(&server, &missing, vec![]))
        .await
        .expect("no targets require no setup");
    assert!(report.outcomes.is_empty());
}
