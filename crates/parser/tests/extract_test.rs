//! End-to-end extraction over Go sources written to a temporary module cache

use provider_codegen_common::{IntermediateModel, Settings};
use provider_codegen_parser::{
    ExtractRequest, ModuleCache, OperationFilter, SdkExtractor, SourceCatalog,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MODULE: &str = "github.com/acme/widgets-go-client/v4";
const VERSION: &str = "v4.0.1";

const WIDGETS_API: &str = r#"package api

import (
	"context"
	import1 "github.com/acme/widgets-go-client/v4/models/widgets/v4/config"
	"github.com/acme/widgets-go-client/v4/client"
)

type WidgetApi struct {
	ApiClient *client.ApiClient
}

func (api *WidgetApi) ListWidgets(ctx context.Context, input *import1.ListWidgetsInput) (*import1.ListWidgetsOutput, error) {
	return nil, nil
}

func (api *WidgetApi) GetWidgetById(extId *string, args ...map[string]interface{}) (*import1.GetWidgetApiResponse, error) {
	return nil, nil
}

type Helper struct{}

func (h *Helper) ListWidgets(ctx context.Context, input *import1.ListWidgetsInput) (*import1.ListWidgetsOutput, error) {
	return nil, nil
}
"#;

const VOLUMES_API: &str = r#"package api

import import1 "github.com/acme/widgets-go-client/v4/models/widgets/v4/config"

type VolumeApi struct{}

func (api *VolumeApi) GetVolumeById(extId *string) (*import1.GetVolumeApiResponse, error) {
	return nil, nil
}
"#;

const CONFIG_MODELS: &str = r#"package config

import import2 "github.com/acme/widgets-go-client/v4/models/common/v1/response"

type ListWidgetsInput struct {
	Page   *int
	Filter *string
}

type ListWidgetsOutput struct {
	ObjectType_ *string
	Data        []Widget
	Metadata    *import2.ApiResponseMetadata
}

type GetWidgetApiResponse struct {
	Data *Widget
}

type GetVolumeApiResponse struct {
	Data *Volume
}

type Widget struct {
	ExtId       *string
	Name        *string `json:"name,omitempty"`
	Status      *TaskStatus
	Reserved_   map[string]interface{}
}

type Volume struct {
	ExtId *string
	Size  *int64
}

type TaskStatus int

const (
	TASKSTATUS_UNKNOWN  TaskStatus = 0
	TASKSTATUS_REDACTED TaskStatus = 1
	TASKSTATUS_QUEUED   TaskStatus = 2
	TASKSTATUS_RUNNING  TaskStatus = 3
)

func (p *Widget) MarshalJSON() ([]byte, error) { return nil, nil }
"#;

const RESPONSE_MODELS: &str = r#"package response

type ApiResponseMetadata struct {
	TotalAvailableResults *int
}
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A module cache holding one version of the widgets client
fn module_cache() -> (TempDir, ModuleCache) {
    let cache_dir = tempfile::tempdir().unwrap();
    let module_dir = cache_dir.path().join(format!("{}@{}", MODULE, VERSION));

    write(&module_dir.join("api/widgets_api.go"), WIDGETS_API);
    write(&module_dir.join("api/volumes_api.go"), VOLUMES_API);
    write(&module_dir.join("api/broken.go"), "package api\n\nfunc (a *WidgetApi) Broken( {\n");
    write(&module_dir.join("api/widgets_api_test.go"), "package api\n\ntype TestOnly struct{}\n");
    write(&module_dir.join("models/widgets/v4/config/config_model.go"), CONFIG_MODELS);
    write(&module_dir.join("models/common/v1/response/response_model.go"), RESPONSE_MODELS);

    let cache = ModuleCache::new(cache_dir.path());
    (cache_dir, cache)
}

fn extract(filter: OperationFilter) -> IntermediateModel {
    let (_dir, cache) = module_cache();
    let extractor = SdkExtractor::new(cache, &Settings::default());
    extractor
        .extract(&ExtractRequest {
            package: format!("{}@{}", MODULE, VERSION),
            api_package: None,
            filter,
        })
        .unwrap()
        .model
}

#[test]
fn test_catalog_skips_broken_and_test_files() {
    let (dir, _cache) = module_cache();
    let api_dir = dir.path().join(format!("{}@{}/api", MODULE, VERSION));

    let catalog = SourceCatalog::build(&api_dir).unwrap();

    assert!(catalog.types.contains_key("WidgetApi"));
    assert!(catalog.types.contains_key("VolumeApi"));
    assert!(!catalog.types.contains_key("TestOnly"));
    assert!(catalog.operations.iter().all(|op| op.name != "Broken"));
    assert_eq!(catalog.types["WidgetApi"].file, "widgets_api.go");
}

#[test]
fn test_catalog_missing_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SourceCatalog::build(&dir.path().join("absent")).is_err());
}

#[test]
fn test_list_widgets_classification() {
    let model = extract(OperationFilter::All);

    assert_eq!(model.namespace_identifier, format!("{}@{}", MODULE, VERSION));
    assert_eq!(model.namespace_path, MODULE);

    let list = model
        .operations
        .iter()
        .find(|op| op.method.name == "ListWidgets")
        .unwrap();
    assert_eq!(list.method.owning_type, "WidgetApi");
    assert_eq!(list.method.file, "api/widgets_api.go");

    let request = list.request_shape.as_ref().unwrap();
    assert_eq!(request.name, "ListWidgetsInput");
    assert_eq!(request.import_alias.as_deref(), Some("import1"));
    assert_eq!(
        request.import_path.as_deref(),
        Some("github.com/acme/widgets-go-client/v4/models/widgets/v4/config")
    );

    let response = list.response_shape.as_ref().unwrap();
    assert_eq!(response.name, "ListWidgetsOutput");
    let names: Vec<&str> = response.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Data", "Metadata"]);
    assert!(response.fields[0].is_composite);
    assert!(response.fields[1].is_composite);
    assert_eq!(response.fields[1].import_alias.as_deref(), Some("import2"));
}

#[test]
fn test_non_api_owning_types_excluded() {
    let model = extract(OperationFilter::All);

    assert!(model
        .operations
        .iter()
        .all(|op| op.method.owning_type.to_lowercase().contains("api")));
    assert!(model
        .operations
        .iter()
        .all(|op| op.method.owning_type != "Helper" && op.method.name != "MarshalJSON"));
    assert_eq!(model.operations.len(), 3);
}

#[test]
fn test_variadic_only_request_is_absent() {
    let model = extract(OperationFilter::All);
    let get = model.find_operation("GetWidgetById").unwrap();

    // `*string` is a primitive, `...map` is skipped
    assert!(get.request_shape.is_none());
    let response = get.response_shape.as_ref().unwrap();
    let widget = &response.fields[0];
    let names: Vec<&str> = widget.children.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["ExtId", "Name", "Status"]);
}

#[test]
fn test_referenced_enums_recorded() {
    let model = extract(OperationFilter::All);

    let status = model.enum_named("TaskStatus").unwrap();
    assert_eq!(status.symbol_for(3).unwrap(), "RUNNING");
    assert_eq!(status.variants.len(), 4);
}

#[test]
fn test_receiver_filter() {
    let model = extract(OperationFilter::from_flags(Some("volumeapi"), None));

    assert_eq!(model.operations.len(), 1);
    assert_eq!(model.operations[0].method.name, "GetVolumeById");
    assert!(model.enums.is_empty());
}

#[test]
fn test_keyword_filter() {
    let model = extract(OperationFilter::from_flags(None, Some("BYID")));

    let names: Vec<&str> = model
        .operations
        .iter()
        .map(|op| op.method.name.as_str())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"GetWidgetById"));
    assert!(names.contains(&"GetVolumeById"));
}

#[test]
fn test_api_package_descends_and_merges_models() {
    let cache_dir = tempfile::tempdir().unwrap();
    let module_dir = cache_dir.path().join(format!("{}@{}", MODULE, VERSION));
    write(&module_dir.join("api/volumes_api.go"), VOLUMES_API);
    // Sibling `models/` directory of `api/`
    write(&module_dir.join("models/volume_model.go"), CONFIG_MODELS);

    let extractor = SdkExtractor::new(ModuleCache::new(cache_dir.path()), &Settings::default());
    let extraction = extractor
        .extract(&ExtractRequest {
            package: format!("{}@{}", MODULE, VERSION),
            api_package: Some(format!("{}/api", MODULE)),
            filter: OperationFilter::All,
        })
        .unwrap();

    assert!(extraction.package_dir.ends_with("api"));
    assert_eq!(extraction.model.namespace_path, format!("{}/api", MODULE));
    let get = extraction.model.find_operation("GetVolumeById").unwrap();
    let response = get.response_shape.as_ref().unwrap();
    assert_eq!(response.file, "volume_model.go");
    assert_eq!(response.fields[0].children.len(), 2);
}

#[test]
fn test_missing_module_reports_download_hint() {
    let cache_dir = tempfile::tempdir().unwrap();
    let extractor = SdkExtractor::new(ModuleCache::new(cache_dir.path()), &Settings::default());

    let err = extractor
        .extract(&ExtractRequest {
            package: format!("{}@{}", MODULE, VERSION),
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.to_string().contains("go mod download"));
}

#[test]
fn test_model_written_with_consumer_keys() {
    let model = extract(OperationFilter::from_flags(Some("WidgetApi"), Some("ListWidgets")));
    let json: serde_json::Value = serde_json::from_str(&model.to_json_pretty().unwrap()).unwrap();

    let first = &json["api_request_response_struct"][0];
    assert_eq!(first["api_method"]["receiver"], "WidgetApi");
    assert_eq!(first["request_struct"]["name"], "ListWidgetsInput");
    assert_eq!(first["response_struct"]["fields"][0]["is_struct"], true);
}
