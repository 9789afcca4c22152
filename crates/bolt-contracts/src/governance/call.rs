//! Cross-invocation helpers that turn a failed [`Response`] into a
//! [`ContractError::DownstreamCall`].

use crate::errors::{ContractError, ContractResult};
use bolt_vm::domain::entities::Response;
use bolt_vm::domain::value_objects::Arg;
use bolt_vm::ports::Stub;
use serde::de::DeserializeOwned;

/// Call `method` on `address` and return the raw result.
pub fn invoke(stub: &dyn Stub, address: &str, method: &str, args: Vec<Arg>) -> ContractResult<Vec<u8>> {
    let Response { ok, result } = stub.cross_invoke(address, method, args);
    if ok {
        Ok(result)
    } else {
        Err(ContractError::DownstreamCall {
            method: method.to_string(),
            message: String::from_utf8_lossy(&result).into_owned(),
        })
    }
}

/// Call `method` and decode its JSON result.
pub fn invoke_json<T: DeserializeOwned>(
    stub: &dyn Stub,
    address: &str,
    method: &str,
    args: Vec<Arg>,
) -> ContractResult<T> {
    let data = invoke(stub, address, method, args)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Call a query returning `"true"` or `"false"`.
pub fn invoke_bool(stub: &dyn Stub, address: &str, method: &str, args: Vec<Arg>) -> ContractResult<bool> {
    let data = invoke(stub, address, method, args)?;
    Ok(data == b"true")
}

/// Encode a boolean query result.
#[must_use]
pub fn bool_response(value: bool) -> Response {
    Response::success(if value { "true" } else { "false" })
}

/// Encode a JSON query result.
pub fn json_response<T: serde::Serialize + ?Sized>(value: &T) -> ContractResult<Response> {
    Ok(Response::success(serde_json::to_vec(value)?))
}
