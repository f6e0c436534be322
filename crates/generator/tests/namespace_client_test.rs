//! Namespace client generation over a hand-built model

use provider_codegen_common::{
    ApiMethod, ApiOperation, CodegenError, IntermediateModel, Result, Settings,
};
use provider_codegen_generator::{NamespaceClientGenerator, SourceFormatter};
use std::fs;
use std::path::Path;

struct FailingFormatter;

impl SourceFormatter for FailingFormatter {
    fn format_file(&self, _path: &Path) -> Result<()> {
        Err(CodegenError::Formatting("gofmt not installed".to_string()))
    }
}

fn operation(name: &str, owning_type: &str) -> ApiOperation {
    ApiOperation {
        method: ApiMethod {
            name: name.to_string(),
            owning_type: owning_type.to_string(),
            file: "api/widgets_api.go".to_string(),
            params: Vec::new(),
        },
        request_shape: None,
        response_shape: None,
    }
}

fn model() -> IntermediateModel {
    IntermediateModel {
        namespace_identifier: "github.com/acme/widgets-go-client/v4@v4.0.1".to_string(),
        namespace_path: "github.com/acme/widgets-go-client/v4".to_string(),
        operations: vec![
            operation("ListWidgets", "WidgetsApi"),
            operation("GetVolumeById", "VolumeApi"),
            operation("ListVolumes", "VolumeApi"),
            operation("CallApi", "ApiClient"),
        ],
        enums: Vec::new(),
    }
}

#[test]
fn test_client_fields_and_constructor() {
    let settings = Settings::default();
    let generator = NamespaceClientGenerator::new(&settings).unwrap();

    let rendered = generator.render(&model()).unwrap();
    let source = &rendered.source;

    assert_eq!(rendered.namespace, "widgets");
    assert!(source.starts_with("package widgets\n"));
    assert!(source.contains("\"github.com/acme/widgets-go-client/v4/api\""));
    assert!(source.contains("widgets \"github.com/acme/widgets-go-client/v4/client\""));
    assert!(source.contains(
        "\"github.com/terraform-providers/terraform-provider-nutanix/nutanix/client\""
    ));

    assert!(source.contains("\tVolumeAPI *api.VolumeApi\n"));
    assert!(source.contains("\tWidgetAPIInstance *api.WidgetsApi\n"));
    assert!(source.contains("\tAPIClientInstance *widgets.ApiClient\n"));
    assert!(!source.contains("*api.ApiClient"));

    assert!(source.contains("func NewWidgetsClient(credentials client.Credentials) (*Client, error) {"));
    assert!(source.contains(
        "if credentials.Username != \"\" && credentials.Password != \"\" && credentials.Endpoint != \"\" {"
    ));
    assert!(source.contains("pcClient.Port = 9440"));
    assert!(source.contains("VolumeAPI: api.NewVolumeApi(baseClient),"));
    assert!(source.contains("WidgetAPIInstance: api.NewWidgetsApi(baseClient),"));
}

#[test]
fn test_settings_override_port_and_module() {
    let settings = Settings {
        transport_port: 443,
        provider_module: "github.com/acme/terraform-provider-acme".to_string(),
        ..Settings::default()
    };
    let generator = NamespaceClientGenerator::new(&settings).unwrap();

    let source = generator.render(&model()).unwrap().source;
    assert!(source.contains("pcClient.Port = 443"));
    assert!(source.contains("\"github.com/acme/terraform-provider-acme/nutanix/client\""));
}

#[test]
fn test_underivable_namespace_is_configuration_error() {
    let settings = Settings::default();
    let generator = NamespaceClientGenerator::new(&settings).unwrap();
    let mut model = model();
    model.namespace_path = "github.com/acme/widgets".to_string();

    let err = generator.render(&model).unwrap_err();
    assert!(matches!(err, CodegenError::Configuration(_)));
}

#[test]
fn test_generate_writes_file_when_formatter_fails() {
    let settings = Settings::default();
    let generator = NamespaceClientGenerator::new(&settings).unwrap();
    let output = tempfile::tempdir().unwrap();

    let generated = generator
        .generate(&model(), output.path(), &FailingFormatter)
        .unwrap();

    assert_eq!(generated.path, output.path().join("widgets").join("widgets.go"));
    assert!(!generated.formatted);
    let written = fs::read_to_string(&generated.path).unwrap();
    assert!(written.contains("type Client struct {"));
}

#[test]
fn test_render_from_sdk_info_file() {
    let sdk_info = serde_json::json!({
        "package": "github.com/acme/widgets-go-client/v4@v4.0.1",
        "package_path": "github.com/acme/widgets-go-client/v4",
        "api_request_response_struct": [
            {
                "api_method": {
                    "name": "ListWidgets",
                    "receiver": "WidgetsApi",
                    "file": "api/widgets_api.go",
                    "params": [{ "name": "page", "type": "*int" }]
                }
            },
            {
                "api_method": {
                    "name": "GetSnapshot",
                    "receiver": "RapidSnapshot",
                    "file": "models/snapshot.go"
                }
            }
        ]
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sdk_info.json");
    fs::write(&path, serde_json::to_string_pretty(&sdk_info).unwrap()).unwrap();

    let model = IntermediateModel::load(&path).unwrap();
    assert_eq!(model.operations[0].method.owning_type, "WidgetsApi");
    assert!(model.operations[1].response_shape.is_none());

    let settings = Settings::default();
    let generator = NamespaceClientGenerator::new(&settings).unwrap();
    let source = generator.render(&model).unwrap().source;

    assert!(source.contains("WidgetAPIInstance: api.NewWidgetsApi(baseClient),"));
    assert!(!source.contains("RapidSnapshot"));
}
