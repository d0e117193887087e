// CDP Bridge - Chrome DevTools Protocol bridge for embedded script engines
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! `Runtime` domain methods.

use cdp_bridge_common::types::{
    Empty, GetPropertiesParams, GetPropertiesResult, NoParams, ReleaseObjectGroupParams,
    ReleaseObjectParams,
};
use eyre::Result;
use tracing::debug;

use crate::{
    agent::DebugAgent, debuggee::ScriptEngine, rpc::router::CallContext, rpc::utils::parse_object_id,
};

/// Mark the runtime domain enabled.
pub fn enable<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.set_runtime_enabled(true);
    Ok(Some(Empty {}))
}

/// Mark the runtime domain disabled.
pub fn disable<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.set_runtime_enabled(false);
    Ok(Some(Empty {}))
}

/// Properties of a remote object.
pub fn get_properties<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: GetPropertiesParams,
) -> Result<Option<GetPropertiesResult>> {
    let Some(record) = parse_object_id(&params.object_id).and_then(|id| agent.registry().object(id))
    else {
        debug!(object_id = %params.object_id, "Unknown object");
        return Ok(None);
    };

    Ok(Some(agent.inspector().properties(
        &record,
        params.own_properties.unwrap_or(false),
        params.accessor_properties_only.unwrap_or(false),
        params.generate_preview.unwrap_or(false),
    )))
}

/// Forget one remote object id.
pub fn release_object<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: ReleaseObjectParams,
) -> Result<Option<Empty>> {
    if let Some(id) = parse_object_id(&params.object_id) {
        agent.registry().release_object(id);
    }
    Ok(Some(Empty {}))
}

/// Forget every remote object id of a group.
pub fn release_object_group<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    params: ReleaseObjectGroupParams,
) -> Result<Option<Empty>> {
    let released = agent.registry().release_object_group(&params.object_group);
    debug!(group = %params.object_group, released, "Released object group");
    Ok(Some(Empty {}))
}

/// Wake a host blocked in [`DebugAgent::wait_for_debugger`].
pub fn run_if_waiting_for_debugger<E: ScriptEngine>(
    agent: &DebugAgent<E>,
    _cx: &mut CallContext,
    _params: NoParams,
) -> Result<Option<Empty>> {
    agent.run_if_waiting();
    Ok(Some(Empty {}))
}
