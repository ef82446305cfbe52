// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract interfaces read by the front-end.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IMemeToken {
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IMemedStaking {
        function stakes(address token, address user) external view returns (uint256 amount, uint256 reward);
    }
}

sol! {
    #[sol(rpc)]
    interface IMemedBattle {
        struct Battle {
            uint256 battleId;
            address memeA;
            address memeB;
            uint256 startTime;
            uint256 endTime;
            uint8 status;
            address winner;
        }

        function getUserBattles(address token) external view returns (Battle[] memory);
    }
}
